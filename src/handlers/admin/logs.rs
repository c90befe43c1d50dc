//! Admin activity log

use axum::extract::{Query, State};
use axum::Json;
use crate::handlers::AppState;
use crate::middleware::AdminUser;
use crate::services::{LogQuery, LogsView};
use crate::utils::errors::Result;

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogsView>> {
    Ok(Json(state.services.audit.list(&query).await?))
}
