use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use ulid::Ulid;

use rentdesk::catalog::{LoadState, PropertyCatalog};
use rentdesk::config::Config;
use rentdesk::dates::DateInterval;
use rentdesk::engine::DayHint;
use rentdesk::model::{Role, User};
use rentdesk::session::Session;
use rentdesk::source::JsonFileSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    rentdesk::observability::init(config.metrics_port);

    let session = Session::start(
        User {
            id: Ulid::new(),
            name: config.user_name.clone(),
            email: config.user_email.clone(),
            role: Role::Guest,
        },
        String::new(),
    );
    let source = Arc::new(JsonFileSource::new(&config.catalog_path));
    let mut catalog = PropertyCatalog::new(session, source);

    info!("rentdesk loading {}", config.catalog_path.display());
    if let Err(e) = catalog.load().await {
        warn!("{e}; retrying once");
        catalog.retry().await?;
    }
    if *catalog.load_state() != LoadState::Ready {
        return Err("catalog did not load".into());
    }

    for update in config.criteria_updates() {
        catalog.update_criteria(update);
    }

    let today = Utc::now().date_naive();
    let window = DateInterval::new(today, today + Duration::days(config.calendar_days - 1))?;

    let visible = catalog.visible();
    info!(
        "{} of {} listings match",
        visible.len(),
        catalog.properties().len()
    );
    for property in &visible {
        let strip: String = catalog
            .day_hints(&property.id, &window)?
            .into_iter()
            .map(|(_, hint)| match hint {
                DayHint::Reserved => 'x',
                _ => '.',
            })
            .collect();
        info!(
            "{} | {} ({}) | {} guests | {:.2}/night | {}",
            property.id,
            property.title,
            property.location.city,
            property.capacity,
            property.price.per_night,
            strip
        );
    }

    catalog.logout();
    Ok(())
}
