//! Registration submission
//!
//! Order of checks: authenticate, rate limit, parse the body, then hand off to
//! the registration service. Each failure stops the later steps.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::info;
use crate::handlers::AppState;
use crate::middleware::{enforce, rate_limit_key, CurrentUser};
use crate::services::{ConfirmMode, RegisterRequest, RegisterResponse};
use crate::utils::errors::Result;

async fn submit(
    state: AppState,
    user: CurrentUser,
    headers: HeaderMap,
    body: Bytes,
    mode: ConfirmMode,
) -> Result<Json<RegisterResponse>> {
    enforce(state.rate_limiter.as_ref(), &rate_limit_key(user.id, &headers)).await?;

    let request = RegisterRequest::from_slice(&body)?;
    info!(user_id = %user.id, event_id = %request.event_id, mode = ?mode, "Registration submitted");

    let response = state.services.registration.register(user.id, request, mode).await?;
    Ok(Json(response))
}

pub async fn register_event(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RegisterResponse>> {
    submit(state, user, headers, body, ConfirmMode::Standard).await
}

/// Same flow, but always confirms without payment
pub async fn register_event_test(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RegisterResponse>> {
    submit(state, user, headers, body, ConfirmMode::AlwaysConfirm).await
}
