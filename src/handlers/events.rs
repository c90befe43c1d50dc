//! Public event browsing

use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;
use crate::handlers::{parse_id, AppState};
use crate::services::{EventDetail, EventSummary};
use crate::utils::errors::Result;

/// Approved, public events with seat usage
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventSummary>>> {
    let events = state.services.catalog.list_public().await?;
    debug!(count = events.len(), "Listed public events");
    Ok(Json(events))
}

/// One approved event with its active form
pub async fn event_detail(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<EventDetail>> {
    let event_id = parse_id(&id, "event id")?;
    Ok(Json(state.services.catalog.detail(event_id).await?))
}
