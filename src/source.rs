use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::dates::DateInterval;
use crate::limits::PLACEHOLDER_IMAGE;
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "listing source unavailable: {e}"),
            SourceError::Parse(e) => write!(f, "malformed listing data: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

// ── External record shapes ───────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLocation {
    pub city: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPrice {
    pub per_night: Option<f64>,
    pub per_week: Option<f64>,
    pub per_month: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReservation {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    #[serde(default)]
    pub guest: GuestContact,
}

/// A listing as the remote API returns it. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProperty {
    /// String or number upstream.
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<RawLocation>,
    pub capacity: Option<u32>,
    pub services: Vec<String>,
    pub price: Option<RawPrice>,
    pub images: Vec<String>,
    pub status: Option<ListingStatus>,
    pub reservations: Vec<RawReservation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUser {
    pub id: Option<Ulid>,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// On-disk layout read by `JsonFileSource`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub properties: Vec<RawProperty>,
    pub users: Vec<RawUser>,
}

fn price_tier(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) => {
            warn!(value = v, "invalid price tier, using 0");
            0.0
        }
        None => 0.0,
    }
}

impl RawProperty {
    /// Map into the core model, filling defaults. Reservations that are
    /// inverted or overlap an earlier one are dropped.
    pub fn into_property(self) -> Property {
        let id = match self.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                let generated = Ulid::new().to_string();
                debug!(id = %generated, "listing without id, generated one");
                generated
            }
        };
        let location = self.location.unwrap_or_default();
        let price = self.price.unwrap_or_default();
        let images = if self.images.is_empty() {
            vec![PLACEHOLDER_IMAGE.to_string()]
        } else {
            self.images
        };

        let mut property = Property {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            location: Location {
                city: location.city.unwrap_or_default(),
                address: location.address.unwrap_or_default(),
            },
            capacity: self.capacity.unwrap_or(1).max(1),
            services: self
                .services
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<BTreeSet<_>>(),
            price: Price {
                per_night: price_tier(price.per_night),
                per_week: price_tier(price.per_week),
                per_month: price_tier(price.per_month),
            },
            images,
            status: self.status.unwrap_or_default(),
            reservations: Vec::new(),
        };

        let mut raw = self.reservations;
        raw.sort_by_key(|r| r.start_date);
        for r in raw {
            let Ok(span) = DateInterval::new(r.start_date, r.end_date) else {
                warn!(property = %property.id, start = %r.start_date, end = %r.end_date, "dropping inverted reservation");
                continue;
            };
            if property.overlapping(&span).next().is_some() {
                warn!(property = %property.id, start = %span.start, end = %span.end, "dropping overlapping reservation");
                continue;
            }
            property.insert_reservation(Reservation {
                id: Ulid::new(),
                span,
                guest: r.guest,
            });
        }
        property
    }
}

impl RawUser {
    pub fn into_user(self) -> User {
        User {
            id: self.id.unwrap_or_else(Ulid::new),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
        }
    }
}

// ── Sources ──────────────────────────────────────────────────────

/// Where listings and known users come from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_properties(&self) -> Result<Vec<RawProperty>, SourceError>;

    async fn fetch_users(&self) -> Result<Vec<RawUser>, SourceError> {
        Ok(Vec::new())
    }

    /// Listings and users in one snapshot. Sources backed by a single
    /// document override this so both lists come from the same read.
    async fn fetch_catalog(&self) -> Result<CatalogFile, SourceError> {
        let properties = self.fetch_properties().await?;
        let users = self.fetch_users().await?;
        Ok(CatalogFile { properties, users })
    }

    fn source_name(&self) -> &'static str;
}

/// Reads a `CatalogFile` JSON document from disk on every fetch.
/// `fetch_catalog` reads it once for both lists.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<CatalogFile, SourceError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ListingSource for JsonFileSource {
    async fn fetch_properties(&self) -> Result<Vec<RawProperty>, SourceError> {
        Ok(self.read().await?.properties)
    }

    async fn fetch_users(&self) -> Result<Vec<RawUser>, SourceError> {
        Ok(self.read().await?.users)
    }

    async fn fetch_catalog(&self) -> Result<CatalogFile, SourceError> {
        self.read().await
    }

    fn source_name(&self) -> &'static str {
        "json_file"
    }
}

/// In-memory source.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub properties: Vec<RawProperty>,
    pub users: Vec<RawUser>,
}

impl StaticSource {
    pub fn new(properties: Vec<RawProperty>, users: Vec<RawUser>) -> Self {
        Self { properties, users }
    }
}

#[async_trait]
impl ListingSource for StaticSource {
    async fn fetch_properties(&self) -> Result<Vec<RawProperty>, SourceError> {
        Ok(self.properties.clone())
    }

    async fn fetch_users(&self) -> Result<Vec<RawUser>, SourceError> {
        Ok(self.users.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}
