//! Authentication middleware
//!
//! Access tokens are HS256 JWTs issued by the external auth provider. They are
//! read from the `Authorization: Bearer` header or the session cookie. Roles
//! are never taken from the token; staff and admin guards read `profiles`.

use std::sync::Arc;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::AuthConfig;
use crate::database::DatabaseService;
use crate::models::{Profile, Role};
use crate::utils::errors::{CampusEventsError, Result};

/// Claims the service relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

/// Verifies access tokens and locates them in a request
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.jwt_audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }

    /// Bearer header first, then the session cookie
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        bearer.or_else(|| {
            CookieJar::from_headers(headers)
                .get(&self.cookie_name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        })
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<CurrentUser> {
        let token = self
            .token_from_headers(headers)
            .ok_or_else(|| CampusEventsError::Authentication("Not authenticated".to_string()))?;

        let claims = self.verify(&token).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            CampusEventsError::Authentication("Not authenticated".to_string())
        })?;

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Reject disabled accounts and roles outside `allowed`
pub fn require_role(profile: &Profile, allowed: &[Role]) -> Result<()> {
    if profile.disabled {
        warn!(user_id = %profile.id, "Disabled account attempted access");
        return Err(CampusEventsError::PermissionDenied("Account disabled".to_string()));
    }

    if !allowed.contains(&profile.role()) {
        warn!(user_id = %profile.id, role = %profile.role, "Unauthorized access attempt");
        return Err(CampusEventsError::PermissionDenied("Not authorized".to_string()));
    }

    Ok(())
}

/// Load the caller's profile and check it against `allowed`
pub async fn authorize(db: &DatabaseService, user_id: Uuid, allowed: &[Role]) -> Result<Profile> {
    let profile = db
        .profiles
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| CampusEventsError::PermissionDenied("Not authorized".to_string()))?;

    require_role(&profile, allowed)?;
    Ok(profile)
}

/// Any caller holding a valid access token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<TokenVerifier>: FromRef<S>,
{
    type Rejection = CampusEventsError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let verifier = Arc::<TokenVerifier>::from_ref(state);
        verifier.authenticate(&parts.headers)
    }
}

/// Organizer or admin profile
#[derive(Debug, Clone)]
pub struct StaffUser(pub Profile);

#[async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
    Arc<TokenVerifier>: FromRef<S>,
    DatabaseService: FromRef<S>,
{
    type Rejection = CampusEventsError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let db = DatabaseService::from_ref(state);
        let profile = authorize(&db, user.id, &[Role::Organizer, Role::Admin]).await?;
        Ok(StaffUser(profile))
    }
}

/// Admin profile
#[derive(Debug, Clone)]
pub struct AdminUser(pub Profile);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<TokenVerifier>: FromRef<S>,
    DatabaseService: FromRef<S>,
{
    type Rejection = CampusEventsError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let db = DatabaseService::from_ref(state);
        let profile = authorize(&db, user.id, &[Role::Admin]).await?;
        Ok(AdminUser(profile))
    }
}
