//! Registrations table and status actions

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use serde::Deserialize;
use crate::handlers::admin::redirect_after;
use crate::handlers::{parse_id, AppState};
use crate::middleware::AdminUser;
use crate::models::{Profile, RegistrationFilter, RegistrationListRow};
use crate::services::RegistrationAction;
use crate::utils::errors::Result;

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Json<Vec<RegistrationListRow>>> {
    Ok(Json(state.services.registration_admin.list(&filter).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub registration_id: Option<String>,
}

async fn apply(state: &AppState, admin: &Profile, form: RegistrationForm) -> Result<String> {
    let action: RegistrationAction = form.action.as_deref().unwrap_or_default().parse()?;
    let registration_id = parse_id(form.registration_id.as_deref().unwrap_or_default(), "registration id")?;

    let registration = state.services.registration_admin.apply(admin, registration_id, action).await?;
    Ok(registration.status.to_lowercase())
}

pub async fn action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<RegistrationForm>,
) -> Redirect {
    redirect_after("registrations", apply(&state, &admin, form).await)
}
