use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::dates::DateInterval;
use crate::engine::{
    day_hints, filter_all, Confirmation, DayHint, GuestRegistry, ReservationWorkflow, WorkflowError, WorkflowState,
};
use crate::limits::*;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability;
use crate::session::Session;
use crate::source::{CatalogFile, ListingSource, SourceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    /// Last load failed; `retry` runs it again.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    NotReady,
    Load(SourceError),
    UnknownProperty(String),
    AlreadyExists(String),
    Forbidden,
    InvalidProperty(&'static str),
    LimitExceeded(&'static str),
    Workflow(WorkflowError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotReady => write!(f, "catalog is not loaded"),
            CatalogError::Load(e) => write!(f, "catalog load failed: {e}"),
            CatalogError::UnknownProperty(id) => write!(f, "unknown property: {id}"),
            CatalogError::AlreadyExists(id) => write!(f, "property already exists: {id}"),
            CatalogError::Forbidden => write!(f, "session may not manage listings"),
            CatalogError::InvalidProperty(msg) => write!(f, "invalid property: {msg}"),
            CatalogError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            CatalogError::Workflow(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<WorkflowError> for CatalogError {
    fn from(e: WorkflowError) -> Self {
        CatalogError::Workflow(e)
    }
}

fn validate_property(p: &Property) -> Result<(), CatalogError> {
    if p.id.trim().is_empty() {
        return Err(CatalogError::InvalidProperty("id is required"));
    }
    if p.title.len() > MAX_TITLE_LEN {
        return Err(CatalogError::InvalidProperty("title too long"));
    }
    if p.capacity == 0 {
        return Err(CatalogError::InvalidProperty("capacity must be at least 1"));
    }
    if !p.price.is_valid() {
        return Err(CatalogError::InvalidProperty("prices must be non-negative"));
    }
    Ok(())
}

/// Owns the listings, the guest registry and one reservation workflow per
/// property. Single writer: nothing here guards against two sessions booking
/// the same dates.
pub struct PropertyCatalog {
    session: Session,
    source: Arc<dyn ListingSource>,
    state: LoadState,
    properties: Vec<Property>,
    guests: GuestRegistry,
    workflows: HashMap<String, ReservationWorkflow>,
    criteria: FilterCriteria,
    notify: Arc<NotifyHub>,
}

impl PropertyCatalog {
    pub fn new(session: Session, source: Arc<dyn ListingSource>) -> Self {
        Self {
            session,
            source,
            state: LoadState::Pending,
            properties: Vec::new(),
            guests: GuestRegistry::new(),
            workflows: HashMap::new(),
            criteria: FilterCriteria::default(),
            notify: Arc::new(NotifyHub::new()),
        }
    }

    // ── Loading ──────────────────────────────────────────────────

    /// Fetch listings and users. All or nothing: a failure leaves the
    /// catalog empty in `Failed`.
    pub async fn load(&mut self) -> Result<(), CatalogError> {
        self.state = LoadState::Pending;
        let started = Instant::now();
        let fetched = self.source.fetch_catalog().await;
        metrics::histogram!(observability::CATALOG_LOAD_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let CatalogFile {
            properties: raw_properties,
            users: raw_users,
        } = match fetched {
            Ok(v) => v,
            Err(e) => {
                warn!(source = self.source.source_name(), error = %e, "catalog load failed");
                metrics::counter!(observability::CATALOG_LOADS_TOTAL, "status" => "error").increment(1);
                self.properties.clear();
                self.workflows.clear();
                self.state = LoadState::Failed(e.to_string());
                return Err(CatalogError::Load(e));
            }
        };

        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(raw_properties.len());
        for raw in raw_properties {
            let property = raw.into_property();
            if !seen.insert(property.id.clone()) {
                warn!(property = %property.id, "duplicate listing id, keeping the first");
                continue;
            }
            if properties.len() >= MAX_PROPERTIES {
                warn!(limit = MAX_PROPERTIES, "catalog truncated");
                break;
            }
            properties.push(property);
        }

        let users = raw_users.into_iter().map(|u| u.into_user());
        self.guests = GuestRegistry::from_users(std::iter::once(self.session.user.clone()).chain(users));
        self.properties = properties;
        self.workflows.clear();
        self.state = LoadState::Ready;

        metrics::counter!(observability::CATALOG_LOADS_TOTAL, "status" => "ok").increment(1);
        metrics::gauge!(observability::CATALOG_PROPERTIES).set(self.properties.len() as f64);
        info!(
            source = self.source.source_name(),
            properties = self.properties.len(),
            guests = self.guests.len(),
            "catalog loaded"
        );
        Ok(())
    }

    /// Re-run a failed load. Does nothing in any other state.
    pub async fn retry(&mut self) -> Result<(), CatalogError> {
        match self.state {
            LoadState::Failed(_) => self.load().await,
            _ => Ok(()),
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    fn ensure_ready(&self) -> Result<(), CatalogError> {
        match self.state {
            LoadState::Ready => Ok(()),
            _ => Err(CatalogError::NotReady),
        }
    }

    fn position(&self, id: &str) -> Result<usize, CatalogError> {
        self.ensure_ready()?;
        self.properties
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownProperty(id.to_string()))
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn guests(&self) -> &GuestRegistry {
        &self.guests
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn update_criteria(&mut self, update: CriteriaUpdate) {
        self.criteria.apply(update);
    }

    /// Listings passing the active criteria, in catalog order.
    pub fn visible(&self) -> Vec<&Property> {
        let visible = filter_all(&self.properties, &self.criteria);
        metrics::histogram!(observability::FILTER_RESULTS).record(visible.len() as f64);
        visible
    }

    pub fn subscribe(&self, property_id: &str) -> broadcast::Receiver<CatalogEvent> {
        self.notify.subscribe(property_id)
    }

    pub fn workflow_state(&self, property_id: &str) -> WorkflowState {
        self.workflows
            .get(property_id)
            .map(|wf| wf.state().clone())
            .unwrap_or_default()
    }

    pub fn selected_range(&self, property_id: &str) -> Option<DateInterval> {
        self.workflows.get(property_id).and_then(|wf| wf.selected_range())
    }

    /// Inline message of the last failed action on this property.
    pub fn message(&self, property_id: &str) -> Option<&str> {
        self.workflows.get(property_id).and_then(|wf| wf.message())
    }

    pub fn day_hints(&self, property_id: &str, window: &DateInterval) -> Result<Vec<(NaiveDate, DayHint)>, CatalogError> {
        if window.nights() >= MAX_HINT_WINDOW_DAYS {
            return Err(CatalogError::LimitExceeded("calendar window too wide"));
        }
        let idx = self.position(property_id)?;
        let selection = self
            .workflows
            .get(property_id)
            .map(|wf| wf.selection())
            .unwrap_or_default();
        Ok(day_hints(&self.properties[idx], &selection, window))
    }

    // ── Reservation flow ─────────────────────────────────────────

    pub fn begin(&mut self, property_id: &str) -> Result<(), CatalogError> {
        self.position(property_id)?;
        Ok(self.workflows.entry(property_id.to_string()).or_default().begin()?)
    }

    pub fn select_date(&mut self, property_id: &str, date: NaiveDate) -> Result<(), CatalogError> {
        let idx = self.position(property_id)?;
        let wf = self.workflows.entry(property_id.to_string()).or_default();
        Ok(wf.select_date(&self.properties[idx], date)?)
    }

    pub fn confirm(&mut self, property_id: &str, guest_name: &str, guest_email: &str) -> Result<Confirmation, CatalogError> {
        let idx = self.position(property_id)?;
        let wf = self.workflows.entry(property_id.to_string()).or_default();
        let outcome = wf.confirm(&mut self.properties[idx], &self.guests, guest_name, guest_email)?;
        self.announce_booking(property_id, &outcome);
        Ok(outcome)
    }

    pub fn register_guest(&mut self, property_id: &str, name: &str, email: &str) -> Result<(User, Confirmation), CatalogError> {
        let idx = self.position(property_id)?;
        let wf = self.workflows.entry(property_id.to_string()).or_default();
        let (user, outcome) = wf.register_guest(&mut self.properties[idx], &mut self.guests, name, email)?;
        self.announce_booking(property_id, &outcome);
        Ok((user, outcome))
    }

    fn announce_booking(&self, property_id: &str, outcome: &Confirmation) {
        if let Confirmation::Booked(reservation) = outcome {
            self.notify.send(CatalogEvent::ReservationConfirmed {
                property_id: property_id.to_string(),
                reservation: reservation.clone(),
            });
        }
    }

    pub fn request_cancel(&mut self, property_id: &str) -> Result<(), CatalogError> {
        let idx = self.position(property_id)?;
        let wf = self.workflows.entry(property_id.to_string()).or_default();
        Ok(wf.request_cancel(&self.properties[idx])?)
    }

    pub fn confirm_cancel(&mut self, property_id: &str) -> Result<Reservation, CatalogError> {
        let idx = self.position(property_id)?;
        let wf = self.workflows.entry(property_id.to_string()).or_default();
        let removed = wf.confirm_cancel(&mut self.properties[idx])?;
        self.notify.send(CatalogEvent::ReservationCancelled {
            property_id: property_id.to_string(),
            reservation: removed.clone(),
        });
        Ok(removed)
    }

    pub fn cancel_flow(&mut self, property_id: &str) -> Result<(), CatalogError> {
        self.position(property_id)?;
        if let Some(wf) = self.workflows.get_mut(property_id) {
            wf.cancel_flow();
        }
        Ok(())
    }

    // ── Listing management ───────────────────────────────────────

    fn ensure_manager(&self) -> Result<(), CatalogError> {
        self.ensure_ready()?;
        if !self.session.can_manage_listings() {
            return Err(CatalogError::Forbidden);
        }
        Ok(())
    }

    pub fn add_property(&mut self, mut property: Property) -> Result<(), CatalogError> {
        self.ensure_manager()?;
        validate_property(&property)?;
        if self.properties.len() >= MAX_PROPERTIES {
            return Err(CatalogError::LimitExceeded("too many properties"));
        }
        if self.property(&property.id).is_some() {
            return Err(CatalogError::AlreadyExists(property.id));
        }
        if property.images.is_empty() {
            property.images.push(PLACEHOLDER_IMAGE.to_string());
        }
        // New listings start with an empty calendar.
        property.reservations.clear();
        let property_id = property.id.clone();
        self.properties.push(property);
        metrics::gauge!(observability::CATALOG_PROPERTIES).set(self.properties.len() as f64);
        info!(property = %property_id, "property added");
        self.notify.send(CatalogEvent::PropertyAdded { property_id });
        Ok(())
    }

    pub fn update_property(&mut self, property_id: &str, update: PropertyUpdate) -> Result<(), CatalogError> {
        self.ensure_manager()?;
        let idx = self.position(property_id)?;
        let mut edited = self.properties[idx].clone();
        match update {
            PropertyUpdate::Title(title) => edited.title = title,
            PropertyUpdate::Description(description) => edited.description = description,
            PropertyUpdate::Location(location) => edited.location = location,
            PropertyUpdate::Capacity(capacity) => edited.capacity = capacity,
            PropertyUpdate::Price(price) => edited.price = price,
            PropertyUpdate::Services(services) => edited.services = services,
            PropertyUpdate::Images(images) if images.is_empty() => {
                edited.images = vec![PLACEHOLDER_IMAGE.to_string()];
            }
            PropertyUpdate::Images(images) => edited.images = images,
            PropertyUpdate::Status(status) => edited.status = status,
        }
        validate_property(&edited)?;
        self.properties[idx] = edited;
        info!(property = %property_id, "property updated");
        self.notify.send(CatalogEvent::PropertyUpdated {
            property_id: property_id.to_string(),
        });
        Ok(())
    }

    pub fn remove_property(&mut self, property_id: &str) -> Result<Property, CatalogError> {
        self.ensure_manager()?;
        let idx = self.position(property_id)?;
        let removed = self.properties.remove(idx);
        self.workflows.remove(property_id);
        metrics::gauge!(observability::CATALOG_PROPERTIES).set(self.properties.len() as f64);
        info!(property = %property_id, reservations = removed.reservations.len(), "property removed");
        self.notify.send(CatalogEvent::PropertyRemoved {
            property_id: property_id.to_string(),
        });
        self.notify.remove(property_id);
        Ok(removed)
    }

    /// End the session. The catalog goes with it.
    pub fn logout(self) {
        self.session.end();
    }
}
