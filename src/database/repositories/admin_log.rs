//! Admin audit log repository implementation

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use crate::models::admin_log::{AdminLog, AdminLogRow, AdminLogFilter, CreateAdminLogRequest};
use crate::utils::errors::CampusEventsError;

#[derive(Clone)]
pub struct AdminLogRepository {
    pool: PgPool,
}

impl AdminLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a log entry
    pub async fn create(&self, request: CreateAdminLogRequest) -> Result<AdminLog, CampusEventsError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, request).await
    }

    /// Append a log entry inside an existing transaction
    pub async fn insert(conn: &mut PgConnection, request: CreateAdminLogRequest) -> Result<AdminLog, CampusEventsError> {
        let log = sqlx::query_as::<_, AdminLog>(
            r#"
            INSERT INTO admin_logs (admin_id, action, details, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, admin_id, action, details, created_at
            "#
        )
        .bind(request.admin_id)
        .bind(request.action)
        .bind(Json(request.details))
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(log)
    }

    /// Filtered log entries, newest first
    pub async fn list(&self, filter: &AdminLogFilter) -> Result<Vec<AdminLogRow>, CampusEventsError> {
        let rows = sqlx::query_as::<_, AdminLogRow>(
            r#"
            SELECT l.id, l.admin_id, l.action, l.details, l.created_at,
                   p.full_name AS admin_name, p.email AS admin_email
            FROM admin_logs l
            LEFT JOIN profiles p ON p.id = l.admin_id
            WHERE ($1::uuid IS NULL OR l.admin_id = $1)
              AND ($2::text IS NULL OR l.action = $2)
              AND ($3::timestamptz IS NULL OR l.created_at >= $3)
            ORDER BY l.created_at DESC
            LIMIT $4
            "#
        )
        .bind(filter.admin_id)
        .bind(filter.action.as_deref())
        .bind(filter.since)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct action names for the filter menu
    pub async fn distinct_actions(&self) -> Result<Vec<String>, CampusEventsError> {
        let actions: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT action FROM admin_logs ORDER BY action")
            .fetch_all(&self.pool)
            .await?;

        Ok(actions.into_iter().map(|a| a.0).collect())
    }
}
