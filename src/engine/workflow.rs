use chrono::NaiveDate;
use tracing::{debug, info};
use ulid::Ulid;

use crate::dates::DateInterval;
use crate::limits::*;
use crate::model::{GuestContact, Property, Reservation, User};

use super::availability::{is_range_available, reservation_covering, Selection};
use super::guests::GuestRegistry;
use super::WorkflowError;

// ── States, events, effects ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    /// Calendar open, nothing picked yet.
    SelectingStart,
    SelectingEnd { start: NaiveDate },
    /// `existing` is set when the range came from clicking a reservation.
    RangeSelected { range: DateInterval, existing: bool },
    /// Email unknown: the guest must register before the booking commits.
    ConfirmingGuest { range: DateInterval, guest: GuestContact },
    ConfirmingCancel { range: DateInterval },
}

impl WorkflowState {
    /// The full selected range, if both ends are set.
    pub fn range(&self) -> Option<DateInterval> {
        match self {
            WorkflowState::RangeSelected { range, .. }
            | WorkflowState::ConfirmingGuest { range, .. }
            | WorkflowState::ConfirmingCancel { range } => Some(*range),
            _ => None,
        }
    }

    pub fn selection(&self) -> Selection {
        match self {
            WorkflowState::Idle | WorkflowState::SelectingStart => Selection::default(),
            WorkflowState::SelectingEnd { start } => Selection {
                start: Some(*start),
                end: None,
            },
            WorkflowState::RangeSelected { range, .. }
            | WorkflowState::ConfirmingGuest { range, .. }
            | WorkflowState::ConfirmingCancel { range } => Selection {
                start: Some(range.start),
                end: Some(range.end),
            },
        }
    }

    pub fn is_confirming(&self) -> bool {
        matches!(
            self,
            WorkflowState::ConfirmingGuest { .. } | WorkflowState::ConfirmingCancel { .. }
        )
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::SelectingStart => "selecting_start",
            WorkflowState::SelectingEnd { .. } => "selecting_end",
            WorkflowState::RangeSelected { .. } => "range_selected",
            WorkflowState::ConfirmingGuest { .. } => "confirming_guest",
            WorkflowState::ConfirmingCancel { .. } => "confirming_cancel",
        }
    }
}

/// Inputs to `transition`. Facts that need the property or the guest
/// registry are resolved by the caller so the transition stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Begin,
    SelectDate {
        date: NaiveDate,
        /// Interval of the reservation covering `date`, if any.
        reservation: Option<DateInterval>,
    },
    Confirm {
        guest: GuestContact,
        available: bool,
        known_guest: bool,
    },
    RegisterGuest { guest: GuestContact },
    RequestCancel { matched: bool },
    ConfirmCancel,
    CancelFlow,
}

/// Side effect the driver must perform before adopting the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Book { range: DateInterval, guest: GuestContact },
    RegisterGuest { guest: GuestContact },
    Cancel { range: DateInterval },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: WorkflowState,
    pub effect: Option<Effect>,
}

impl Step {
    fn to(state: WorkflowState) -> Self {
        Self { state, effect: None }
    }
}

fn validate_guest(guest: &GuestContact) -> Result<(), WorkflowError> {
    if guest.name.trim().is_empty() {
        return Err(WorkflowError::Validation("guest name is required"));
    }
    if guest.email.trim().is_empty() {
        return Err(WorkflowError::Validation("guest email is required"));
    }
    if guest.name.len() > MAX_NAME_LEN {
        return Err(WorkflowError::Validation("guest name too long"));
    }
    if guest.email.len() > MAX_EMAIL_LEN {
        return Err(WorkflowError::Validation("guest email too long"));
    }
    Ok(())
}

/// Pure transition function. On `Err` the caller keeps `state` unchanged.
pub fn transition(state: &WorkflowState, event: WorkflowEvent) -> Result<Step, WorkflowError> {
    use WorkflowState::*;

    match event {
        WorkflowEvent::Begin => {
            if state.is_confirming() {
                return Err(WorkflowError::Validation("finish or cancel the open confirmation first"));
            }
            Ok(Step::to(SelectingStart))
        }

        WorkflowEvent::SelectDate { date, reservation } => {
            if state.is_confirming() {
                return Err(WorkflowError::Validation("finish or cancel the open confirmation first"));
            }
            if let Some(range) = reservation {
                return Ok(Step::to(RangeSelected { range, existing: true }));
            }
            match state {
                SelectingEnd { start } if date > *start => Ok(Step::to(RangeSelected {
                    range: DateInterval { start: *start, end: date },
                    existing: false,
                })),
                _ => Ok(Step::to(SelectingEnd { start: date })),
            }
        }

        WorkflowEvent::Confirm {
            guest,
            available,
            known_guest,
        } => {
            let range = match state {
                RangeSelected { range, .. } | ConfirmingGuest { range, .. } => *range,
                _ => return Err(WorkflowError::Validation("select a start and end date first")),
            };
            validate_guest(&guest)?;
            if range.nights() > MAX_STAY_NIGHTS {
                return Err(WorkflowError::Validation("stay is too long"));
            }
            if !available {
                return Err(WorkflowError::RangeUnavailable(range));
            }
            if !known_guest {
                return Ok(Step::to(ConfirmingGuest { range, guest }));
            }
            Ok(Step {
                state: Idle,
                effect: Some(Effect::Book { range, guest }),
            })
        }

        WorkflowEvent::RegisterGuest { guest } => {
            let ConfirmingGuest { range, .. } = state else {
                return Err(WorkflowError::Validation("no booking is waiting for guest registration"));
            };
            validate_guest(&guest)?;
            Ok(Step {
                state: ConfirmingGuest {
                    range: *range,
                    guest: guest.clone(),
                },
                effect: Some(Effect::RegisterGuest { guest }),
            })
        }

        WorkflowEvent::RequestCancel { matched } => {
            let RangeSelected { range, .. } = state else {
                return Err(WorkflowError::Validation("select a reservation first"));
            };
            if !matched {
                return Err(WorkflowError::NotFound(*range));
            }
            Ok(Step::to(ConfirmingCancel { range: *range }))
        }

        WorkflowEvent::ConfirmCancel => {
            let ConfirmingCancel { range } = state else {
                return Err(WorkflowError::Validation("no cancellation is pending"));
            };
            Ok(Step {
                state: Idle,
                effect: Some(Effect::Cancel { range: *range }),
            })
        }

        WorkflowEvent::CancelFlow => Ok(Step::to(Idle)),
    }
}

// ── Driver ───────────────────────────────────────────────────────

/// Outcome of a confirm request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Booked(Reservation),
    /// Email unknown; waiting on `register_guest`.
    GuestUnknown,
}

/// Per-property reservation flow: current state, the booking form and the
/// inline message of the last failure.
#[derive(Debug, Clone, Default)]
pub struct ReservationWorkflow {
    state: WorkflowState,
    form: GuestContact,
    message: Option<String>,
}

impl ReservationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn selected_range(&self) -> Option<DateInterval> {
        self.state.range()
    }

    /// Inline message left by the last failed action.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn form(&self) -> &GuestContact {
        &self.form
    }

    pub fn set_guest_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
    }

    pub fn set_guest_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
    }

    fn step(&mut self, event: WorkflowEvent) -> Result<Step, WorkflowError> {
        transition(&self.state, event).map_err(|e| self.record(e))
    }

    fn record(&mut self, err: WorkflowError) -> WorkflowError {
        debug!(state = self.state.label(), error = %err, "workflow action rejected");
        metrics::counter!(crate::observability::WORKFLOW_ERRORS_TOTAL, "kind" => err.kind()).increment(1);
        self.message = Some(err.to_string());
        err
    }

    fn commit(&mut self, state: WorkflowState) {
        debug!(from = self.state.label(), to = state.label(), "workflow transition");
        self.state = state;
        self.message = None;
    }

    pub fn begin(&mut self) -> Result<(), WorkflowError> {
        let step = self.step(WorkflowEvent::Begin)?;
        self.commit(step.state);
        Ok(())
    }

    pub fn select_date(&mut self, property: &Property, date: NaiveDate) -> Result<(), WorkflowError> {
        let reservation = reservation_covering(property, date).map(|r| r.span);
        let step = self.step(WorkflowEvent::SelectDate { date, reservation })?;
        self.commit(step.state);
        Ok(())
    }

    /// Re-checks availability against the property as it is now, so a stale
    /// selection cannot double-book.
    pub fn confirm(
        &mut self,
        property: &mut Property,
        guests: &GuestRegistry,
        name: &str,
        email: &str,
    ) -> Result<Confirmation, WorkflowError> {
        self.form = GuestContact::new(name, email);
        let guest = GuestContact::new(name.trim(), email.trim());
        // Overlong stays are rejected by `transition` before availability matters.
        let available = self
            .state
            .range()
            .filter(|r| r.nights() <= MAX_STAY_NIGHTS)
            .is_some_and(|r| is_range_available(property, r.start, r.end));
        let known_guest = guests.contains(&guest.email);

        let step = self.step(WorkflowEvent::Confirm {
            guest,
            available,
            known_guest,
        })?;

        match step.effect {
            Some(Effect::Book { range, guest }) => {
                if property.reservations.len() >= MAX_RESERVATIONS_PER_PROPERTY {
                    return Err(self.record(WorkflowError::Validation("too many reservations on property")));
                }
                let reservation = Reservation {
                    id: Ulid::new(),
                    span: range,
                    guest,
                };
                property.insert_reservation(reservation.clone());
                self.commit(step.state);
                self.form = GuestContact::default();
                metrics::counter!(crate::observability::RESERVATIONS_CONFIRMED_TOTAL).increment(1);
                info!(
                    property = %property.id,
                    reservation = %reservation.id,
                    start = %range.start,
                    end = %range.end,
                    "reservation confirmed"
                );
                Ok(Confirmation::Booked(reservation))
            }
            _ => {
                self.commit(step.state);
                Ok(Confirmation::GuestUnknown)
            }
        }
    }

    /// Registers the guest, then runs `confirm` again with the now-known email.
    pub fn register_guest(
        &mut self,
        property: &mut Property,
        guests: &mut GuestRegistry,
        name: &str,
        email: &str,
    ) -> Result<(User, Confirmation), WorkflowError> {
        let step = self.step(WorkflowEvent::RegisterGuest {
            guest: GuestContact::new(name.trim(), email.trim()),
        })?;
        let Some(Effect::RegisterGuest { guest }) = &step.effect else {
            return Err(self.record(WorkflowError::Validation("guest registration did not run")));
        };
        let (user, inserted) = guests.register(guest);
        if inserted {
            metrics::counter!(crate::observability::GUESTS_REGISTERED_TOTAL).increment(1);
            info!(user = %user.id, "guest registered");
        } else {
            debug!(user = %user.id, "guest already registered");
        }
        self.commit(step.state);

        let confirmation = self.confirm(property, guests, name, email)?;
        Ok((user, confirmation))
    }

    pub fn request_cancel(&mut self, property: &Property) -> Result<(), WorkflowError> {
        let matched = self
            .state
            .range()
            .is_some_and(|r| property.reservation_matching(&r).is_some());
        let step = self.step(WorkflowEvent::RequestCancel { matched })?;
        self.commit(step.state);
        Ok(())
    }

    pub fn confirm_cancel(&mut self, property: &mut Property) -> Result<Reservation, WorkflowError> {
        let step = self.step(WorkflowEvent::ConfirmCancel)?;
        let Some(Effect::Cancel { range }) = step.effect else {
            return Err(self.record(WorkflowError::Validation("no cancellation is pending")));
        };
        let Some(removed) = property.remove_reservation_matching(&range) else {
            return Err(self.record(WorkflowError::NotFound(range)));
        };
        self.commit(step.state);
        metrics::counter!(crate::observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        info!(
            property = %property.id,
            reservation = %removed.id,
            start = %range.start,
            end = %range.end,
            "reservation cancelled"
        );
        Ok(removed)
    }

    /// Back out of any dialog or selection without touching the property.
    pub fn cancel_flow(&mut self) {
        if let Ok(step) = transition(&self.state, WorkflowEvent::CancelFlow) {
            self.commit(step.state);
        }
    }
}
