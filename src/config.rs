use std::path::PathBuf;

use crate::limits::MAX_HINT_WINDOW_DAYS;
use crate::model::CriteriaUpdate;

/// Runtime settings for the `rentdesk` binary, read from `RENTDESK_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub user_name: String,
    pub user_email: String,
    pub metrics_port: Option<u16>,
    /// Days of availability shown per listing, at most `MAX_HINT_WINDOW_DAYS`.
    pub calendar_days: i64,
    pub city: Option<String>,
    pub min_capacity: Option<u32>,
    pub max_price: Option<f64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            catalog_path: PathBuf::from(non_empty("RENTDESK_CATALOG").unwrap_or_else(|| "./data/catalog.json".into())),
            user_name: non_empty("RENTDESK_USER_NAME").unwrap_or_else(|| "Guest".into()),
            user_email: non_empty("RENTDESK_USER_EMAIL").unwrap_or_else(|| "guest@localhost".into()),
            metrics_port: non_empty("RENTDESK_METRICS_PORT").and_then(|s| s.parse().ok()),
            calendar_days: non_empty("RENTDESK_CALENDAR_DAYS")
                .and_then(|s| s.parse().ok())
                .filter(|d| (1..=MAX_HINT_WINDOW_DAYS).contains(d))
                .unwrap_or(14),
            city: non_empty("RENTDESK_CITY"),
            min_capacity: non_empty("RENTDESK_MIN_CAPACITY").and_then(|s| s.parse().ok()),
            max_price: non_empty("RENTDESK_MAX_PRICE").and_then(|s| s.parse().ok()),
        }
    }

    /// Filter edits implied by the configured search fields.
    pub fn criteria_updates(&self) -> Vec<CriteriaUpdate> {
        let mut updates = Vec::new();
        if let Some(city) = &self.city {
            updates.push(CriteriaUpdate::City(city.clone()));
        }
        if self.min_capacity.is_some() {
            updates.push(CriteriaUpdate::MinCapacity(self.min_capacity));
        }
        if self.max_price.is_some() {
            updates.push(CriteriaUpdate::MaxPrice(self.max_price));
        }
        updates
    }
}
