mod availability;
mod error;
mod filter;
mod guests;
mod workflow;

pub use availability::{day_hints, is_range_available, is_reserved, reservation_covering, DayHint, Selection};
pub use error::WorkflowError;
pub use filter::{filter_all, matches};
pub use guests::GuestRegistry;
pub use workflow::{transition, Confirmation, Effect, ReservationWorkflow, Step, WorkflowEvent, WorkflowState};
