//! CSV downloads

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Form;
use serde::Deserialize;
use crate::handlers::{parse_id, AppState};
use crate::middleware::AdminUser;
use crate::services::ExportType;
use crate::utils::errors::Result;
use crate::utils::helpers::non_blank;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportForm {
    #[serde(default)]
    pub export_type: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

pub async fn export(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<ExportForm>,
) -> Result<impl IntoResponse> {
    let export_type: ExportType = form.export_type.as_deref().unwrap_or_default().parse()?;
    let event_id = non_blank(form.event_id.as_deref())
        .map(|id| parse_id(&id, "eventId"))
        .transpose()?;

    let export = state.services.exports.export(&admin, export_type, event_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", export.filename)),
        ],
        export.body,
    ))
}
