//! Door check-in by entry code or registration id

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use crate::handlers::AppState;
use crate::middleware::{authorize, enforce, rate_limit_key, CurrentUser};
use crate::models::{CheckInTarget, Role};
use crate::utils::errors::Result;

pub async fn check_in(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    enforce(state.rate_limiter.as_ref(), &rate_limit_key(user.id, &headers)).await?;

    let target = CheckInTarget::from_slice(&body)?;
    let staff = authorize(&state.db, user.id, &[Role::Organizer, Role::Admin]).await?;

    let outcome = state.services.check_in.check_in(&staff, target).await?;
    Ok(Json(json!({
        "success": true,
        "registration_id": outcome.registration_id,
        "already_checked_in": outcome.already_checked_in,
        "checked_in_at": outcome.checked_in_at,
    })))
}
