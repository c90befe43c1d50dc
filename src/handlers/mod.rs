//! HTTP handlers module
//!
//! This module contains the axum handlers organized by audience:
//! - Public handlers for browsing, registration, tickets and check-in
//! - Admin handlers under `/api/admin`, JSON reads and form actions

pub mod admin;
pub mod check_in;
pub mod events;
pub mod registration;
pub mod session;
pub mod tickets;
pub mod uploads;

use std::sync::Arc;
use axum::extract::{DefaultBodyLimit, FromRef, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::config::Settings;
use crate::database::DatabaseService;
use crate::middleware::{RateLimiter, TokenVerifier};
use crate::services::registration::MAX_UPLOAD_BYTES;
use crate::services::ServiceFactory;

/// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseService,
    pub services: ServiceFactory,
    pub tokens: Arc<TokenVerifier>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        db: DatabaseService,
        services: ServiceFactory,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let tokens = Arc::new(TokenVerifier::new(&settings.auth));
        Self {
            settings: Arc::new(settings),
            db,
            services,
            tokens,
            rate_limiter,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/logout", post(session::admin_logout))
        .route("/overview", get(admin::events::overview))
        .route("/events", get(admin::events::list_events))
        .route("/create-event", post(admin::events::create_event))
        .route("/update-event", post(admin::events::update_event))
        .route("/clone-event", post(admin::events::clone_event))
        .route("/exports", post(admin::exports::export))
        .route("/attendance", get(admin::attendance::view).post(admin::attendance::action))
        .route("/registrations", get(admin::registrations::list).post(admin::registrations::action))
        .route("/payments", get(admin::payments::list))
        .route("/manual-fixes", get(admin::payments::manual_fixes).post(admin::payments::manual_fix_action))
        .route("/form-control", get(admin::form_control::list).post(admin::form_control::action))
        .route("/users", get(admin::users::list).post(admin::users::action))
        .route("/logs", get(admin::logs::list));

    Router::new()
        .route("/health", get(health))
        .route("/logout", get(session::logout))
        .route("/api/events", get(events::list_events))
        .route("/api/events/:id", get(events::event_detail))
        .route(
            "/api/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/api/register-event", post(registration::register_event))
        .route("/api/register-event-test", post(registration::register_event_test))
        .route("/api/check-in", post(check_in::check_in))
        .route("/api/tickets/:id", get(tickets::ticket))
        .route("/api/tickets/:id/qr.svg", get(tickets::ticket_qr))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "healthy": status.is_healthy(),
            "issues": status.get_issues(),
            "services": status,
        })),
    )
}

/// Parse a path or form id, naming it in the error
pub(crate) fn parse_id(raw: &str, name: &str) -> crate::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(raw.trim())
        .map_err(|_| crate::CampusEventsError::Validation(format!("Invalid {}", name)))
}
