//! Profile repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::profile::{Profile, CreateProfileRequest, Role};
use crate::utils::errors::CampusEventsError;

const PROFILE_COLUMNS: &str = "id, full_name, email, role, disabled, created_at, updated_at";

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new profile
    pub async fn create(&self, request: CreateProfileRequest) -> Result<Profile, CampusEventsError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (id, full_name, email, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(request.id)
        .bind(request.full_name)
        .bind(request.email.trim().to_lowercase())
        .bind(request.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Find profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, CampusEventsError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Find profile by email, case-insensitively
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, CampusEventsError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE lower(email) = lower($1)",
            PROFILE_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// List profiles, optionally narrowed by role and a name/email search
    pub async fn list(&self, role: Option<Role>, search: Option<&str>) -> Result<Vec<Profile>, CampusEventsError> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));
        let profiles = sqlx::query_as::<_, Profile>(&format!(
            r#"
            SELECT {} FROM profiles
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR full_name ILIKE $2 OR email ILIKE $2)
            ORDER BY created_at DESC
            "#,
            PROFILE_COLUMNS
        ))
        .bind(role.map(|r| r.as_str()))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Change a profile's role
    pub async fn update_role(&self, id: Uuid, role: Role) -> Result<Profile, CampusEventsError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Enable or disable a profile
    pub async fn set_disabled(&self, id: Uuid, disabled: bool) -> Result<Profile, CampusEventsError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET disabled = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(disabled)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Count total profiles
    pub async fn count(&self) -> Result<i64, CampusEventsError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
