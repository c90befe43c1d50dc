//! Attendance desk

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use serde::Deserialize;
use uuid::Uuid;
use crate::handlers::admin::redirect_after;
use crate::handlers::{parse_id, AppState};
use crate::middleware::AdminUser;
use crate::models::{CheckInTarget, Profile};
use crate::services::AttendanceView;
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::helpers::non_blank;

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

pub async fn view(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<AttendanceView>> {
    Ok(Json(state.services.attendance.view(query.event_id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub registration_id: Option<String>,
    #[serde(default)]
    pub entry_code: Option<String>,
}

async fn apply(state: &AppState, admin: &Profile, form: AttendanceForm) -> Result<String> {
    let registration_id = non_blank(form.registration_id.as_deref());
    let entry_code = non_blank(form.entry_code.as_deref());

    let target = match (form.action.as_deref().unwrap_or_default(), entry_code, registration_id) {
        ("checkin_by_code", Some(code), _) => CheckInTarget::EntryCode(code),
        ("checkin" | "checkin_by_id", _, Some(id)) => CheckInTarget::RegistrationId(parse_id(&id, "registration id")?),
        ("undo", _, Some(id)) => {
            state
                .services
                .check_in
                .undo(admin, parse_id(&id, "registration id")?)
                .await?;
            return Ok("undone".to_string());
        }
        _ => return Err(CampusEventsError::Validation("Invalid attendance action".to_string())),
    };

    let outcome = state.services.check_in.check_in(admin, target).await?;
    Ok(if outcome.already_checked_in {
        "already_checked_in".to_string()
    } else {
        "checked_in".to_string()
    })
}

pub async fn action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<AttendanceForm>,
) -> Redirect {
    redirect_after("attendance", apply(&state, &admin, form).await)
}
