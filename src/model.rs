use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::dates::DateInterval;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub address: String,
}

/// Price tiers. All non-negative; missing tiers load as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub per_night: f64,
    pub per_week: f64,
    pub per_month: f64,
}

impl Price {
    pub fn is_valid(&self) -> bool {
        [self.per_night, self.per_week, self.per_month]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Paused,
}

/// Name and email as entered on the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub email: String,
}

impl GuestContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub span: DateInterval,
    pub guest: GuestContact,
}

impl Reservation {
    pub fn start(&self) -> NaiveDate {
        self.span.start
    }

    pub fn end(&self) -> NaiveDate {
        self.span.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: Location,
    /// Max guests, at least 1.
    pub capacity: u32,
    pub services: BTreeSet<String>,
    pub price: Price,
    pub images: Vec<String>,
    pub status: ListingStatus,
    /// Sorted by `span.start`, never overlapping.
    pub reservations: Vec<Reservation>,
}

impl Property {
    pub fn new(id: impl Into<String>, title: impl Into<String>, city: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            location: Location {
                city: city.into(),
                address: String::new(),
            },
            capacity: capacity.max(1),
            services: BTreeSet::new(),
            price: Price::default(),
            images: Vec::new(),
            status: ListingStatus::Active,
            reservations: Vec::new(),
        }
    }

    /// Insert keeping reservations sorted by start date. Callers check overlap first.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    /// Remove the reservation whose interval equals `span` exactly.
    pub fn remove_reservation_matching(&mut self, span: &DateInterval) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.span == *span)?;
        Some(self.reservations.remove(pos))
    }

    pub fn reservation_matching(&self, span: &DateInterval) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.span == *span)
    }

    /// Reservations sharing at least one date with `query`.
    /// Binary search skips everything starting after `query.end`.
    pub fn overlapping(&self, query: &DateInterval) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.span.start <= query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.span.end >= query.start)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Owner,
    Admin,
}

impl Role {
    pub fn can_manage_listings(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Ulid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ── Filtering ────────────────────────────────────────────────────

/// Inclusive nightly price bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the city. Empty matches every city.
    pub city: String,
    pub min_capacity: Option<u32>,
    pub price_range: PriceRange,
    pub required_services: BTreeSet<String>,
    /// Excludes properties with a reservation overlapping this range.
    pub date_range: Option<DateInterval>,
    pub status: Option<ListingStatus>,
}

/// A single field-level edit of the active criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaUpdate {
    City(String),
    MinCapacity(Option<u32>),
    MinPrice(Option<f64>),
    MaxPrice(Option<f64>),
    RequireService(String),
    DropService(String),
    DateRange(Option<DateInterval>),
    Status(Option<ListingStatus>),
    Reset,
}

impl FilterCriteria {
    pub fn apply(&mut self, update: CriteriaUpdate) {
        match update {
            CriteriaUpdate::City(city) => self.city = city.trim().to_string(),
            CriteriaUpdate::MinCapacity(min) => self.min_capacity = min,
            CriteriaUpdate::MinPrice(min) => self.price_range.min = min,
            CriteriaUpdate::MaxPrice(max) => self.price_range.max = max,
            CriteriaUpdate::RequireService(service) => {
                self.required_services.insert(service);
            }
            CriteriaUpdate::DropService(service) => {
                self.required_services.remove(&service);
            }
            CriteriaUpdate::DateRange(range) => self.date_range = range,
            CriteriaUpdate::Status(status) => self.status = status,
            CriteriaUpdate::Reset => *self = FilterCriteria::default(),
        }
    }
}

/// A single field-level edit of a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyUpdate {
    Title(String),
    Description(String),
    Location(Location),
    Capacity(u32),
    Price(Price),
    Services(BTreeSet<String>),
    Images(Vec<String>),
    Status(ListingStatus),
}

// ── Notifications ────────────────────────────────────────────────

/// Broadcast to views of a property after the catalog mutates it.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    PropertyAdded { property_id: String },
    PropertyUpdated { property_id: String },
    PropertyRemoved { property_id: String },
    ReservationConfirmed { property_id: String, reservation: Reservation },
    ReservationCancelled { property_id: String, reservation: Reservation },
}

impl CatalogEvent {
    pub fn property_id(&self) -> &str {
        match self {
            CatalogEvent::PropertyAdded { property_id }
            | CatalogEvent::PropertyUpdated { property_id }
            | CatalogEvent::PropertyRemoved { property_id }
            | CatalogEvent::ReservationConfirmed { property_id, .. }
            | CatalogEvent::ReservationCancelled { property_id, .. } => property_id,
        }
    }
}
