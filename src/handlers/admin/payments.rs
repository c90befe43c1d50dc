//! Payments and manual fixes

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Json};
use crate::handlers::admin::redirect_after;
use crate::handlers::AppState;
use crate::middleware::AdminUser;
use crate::models::{PaymentFilter, PaymentListRow, Profile};
use crate::services::{ManualFix, ManualFixForm, PaymentsView};
use crate::utils::errors::Result;

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<PaymentsView>> {
    Ok(Json(state.services.manual_fixes.payments(&filter).await?))
}

pub async fn manual_fixes(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<PaymentListRow>>> {
    Ok(Json(state.services.manual_fixes.suspicious_payments().await?))
}

async fn apply(state: &AppState, admin: &Profile, form: ManualFixForm) -> Result<String> {
    let fix = ManualFix::from_form(&form)?;
    let status = fix.success_status();
    state.services.manual_fixes.apply(admin, fix).await?;
    Ok(status.to_string())
}

pub async fn manual_fix_action(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<ManualFixForm>,
) -> Redirect {
    redirect_after("manual-fixes", apply(&state, &admin, form).await)
}
