//! Error type, tracing setup and small formatting helpers

pub mod errors;
pub mod logging;
pub mod helpers;

pub use errors::{CampusEventsError, Result};
