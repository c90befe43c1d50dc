//! Campus Events
//!
//! Event registration, ticketing and door check-in for university events.
//! This library provides the HTTP service (public pages, registration and
//! the admin dashboard API) together with a typed client for it.

pub mod client;
pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use config::Settings;
pub use utils::errors::{CampusEventsError, Result};
pub use database::DatabaseService;
pub use handlers::{router, AppState};
pub use services::ServiceFactory;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Name and version, as printed in the startup banner
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
