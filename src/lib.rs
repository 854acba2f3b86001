pub mod catalog;
pub mod config;
pub mod dates;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod session;
pub mod source;
