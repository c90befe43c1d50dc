//! Event management and the dashboard overview

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use crate::handlers::AppState;
use crate::middleware::AdminUser;
use crate::services::events::{parse_json_body, CloneEventBody, CreateEventBody, UpdateEventBody};
use crate::services::{EventSummary, OverviewMetrics};
use crate::utils::errors::Result;

pub async fn overview(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<OverviewMetrics>> {
    Ok(Json(state.services.overview.metrics().await?))
}

pub async fn list_events(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<EventSummary>>> {
    Ok(Json(state.services.catalog.list_all().await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: CreateEventBody = parse_json_body(&body)?;
    let event = state.services.event_admin.create(&admin, body).await?;
    Ok(Json(json!({"success": true, "event": event})))
}

pub async fn update_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: UpdateEventBody = parse_json_body(&body)?;
    let event = state.services.event_admin.update(&admin, body).await?;
    Ok(Json(json!({"success": true, "event": event})))
}

pub async fn clone_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    body: Bytes,
) -> Result<Json<Value>> {
    let body: CloneEventBody = parse_json_body(&body)?;
    let event = state.services.event_admin.clone_event(&admin, body).await?;
    Ok(Json(json!({"success": true, "event": event})))
}
