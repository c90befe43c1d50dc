//! Ticket pages

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use crate::handlers::{parse_id, AppState};
use crate::middleware::CurrentUser;
use crate::services::TicketView;
use crate::utils::errors::Result;

pub async fn ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TicketView>> {
    let registration_id = parse_id(&id, "registration id")?;
    Ok(Json(state.services.tickets.view(&user, registration_id).await?))
}

pub async fn ticket_qr(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let registration_id = parse_id(&id, "registration id")?;
    let svg = state.services.tickets.qr_svg(&user, registration_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
