//! Session teardown

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde_json::json;
use crate::handlers::AppState;
use crate::middleware::AdminUser;
use crate::utils::errors::Result;

fn clear_session(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(state.tokens.cookie_name().to_string()).path("/"))
}

/// Clear the session cookie and return to the public site
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = clear_session(&state, jar);
    (jar, Redirect::to(&state.settings.site.base_url))
}

pub async fn admin_logout(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    state
        .services
        .audit
        .record(
            admin.id,
            "ADMIN_LOGOUT",
            json!({"timestamp": Utc::now().to_rfc3339(), "user_agent": user_agent}),
        )
        .await?;

    Ok((clear_session(&state, jar), Redirect::to("/admin")))
}
