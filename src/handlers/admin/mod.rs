//! Admin dashboard handlers
//!
//! Reads return JSON. Form actions answer with a 303 back to the dashboard
//! page, carrying `?status=` on success and `?error=` on failure.

pub mod attendance;
pub mod events;
pub mod exports;
pub mod form_control;
pub mod logs;
pub mod payments;
pub mod registrations;
pub mod users;

use axum::response::Redirect;
use tracing::warn;
use crate::utils::errors::Result;

pub const DASHBOARD_PATH: &str = "/admin-dashboard";

/// Location a form action redirects to
pub fn action_location(page: &str, outcome: &Result<String>) -> String {
    match outcome {
        Ok(status) => format!("{}/{}?status={}", DASHBOARD_PATH, page, urlencoding::encode(status)),
        Err(e) => format!(
            "{}/{}?error={}",
            DASHBOARD_PATH,
            page,
            urlencoding::encode(&e.public_message())
        ),
    }
}

pub fn redirect_after(page: &str, outcome: Result<String>) -> Redirect {
    if let Err(e) = &outcome {
        warn!(page = page, error = %e, "Admin action failed");
    }
    Redirect::to(&action_location(page, &outcome))
}
