//! Form field control

use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Json};
use serde::Deserialize;
use crate::handlers::admin::redirect_after;
use crate::handlers::{parse_id, AppState};
use crate::middleware::AdminUser;
use crate::models::{FormFieldControlRow, Profile};
use crate::services::FieldControlAction;
use crate::utils::errors::Result;

pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<FormFieldControlRow>>> {
    Ok(Json(state.services.form_control.list().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldControlForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub required: Option<String>,
}

async fn apply(state: &AppState, admin: &Profile, form: FieldControlForm) -> Result<String> {
    let action = FieldControlAction::parse(form.action.as_deref().unwrap_or_default(), form.required.as_deref())?;
    let event_id = parse_id(form.event_id.as_deref().unwrap_or_default(), "event id")?;
    let field_id = parse_id(form.field_id.as_deref().unwrap_or_default(), "field id")?;

    state.services.form_control.apply(admin, event_id, field_id, action).await?;
    Ok(action.form_name().to_string())
}

pub async fn action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<FieldControlForm>,
) -> Redirect {
    redirect_after("form-control", apply(&state, &admin, form).await)
}
