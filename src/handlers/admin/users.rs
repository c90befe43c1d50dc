//! User roles and account status

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use serde::Deserialize;
use crate::handlers::admin::redirect_after;
use crate::handlers::{parse_id, AppState};
use crate::middleware::AdminUser;
use crate::models::{Profile, Role};
use crate::services::UserAction;
use crate::utils::errors::Result;
use crate::utils::helpers::non_blank;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Profile>>> {
    // Unknown roles list everyone
    let role = query.role.as_deref().and_then(|r| r.parse::<Role>().ok());
    let search = non_blank(query.search.as_deref());
    Ok(Json(state.services.users.list(role, search.as_deref()).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn apply(state: &AppState, admin: &Profile, form: UserForm) -> Result<String> {
    let action: UserAction = form.action.as_deref().unwrap_or_default().parse()?;
    let target_id = parse_id(form.user_id.as_deref().unwrap_or_default(), "user id")?;

    let updated = state.services.users.apply(admin, target_id, action).await?;
    Ok(match action {
        UserAction::Promote | UserAction::Demote => format!("role_{}", updated.role),
        UserAction::Disable => "user_disabled".to_string(),
        UserAction::Enable => "user_enabled".to_string(),
    })
}

pub async fn action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<UserForm>,
) -> Redirect {
    redirect_after("users", apply(&state, &admin, form).await)
}
