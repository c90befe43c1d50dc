//! Admin audit log model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminLog {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub details: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Log entry with the acting admin's profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminLogRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: AdminLog,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAdminLogRequest {
    pub admin_id: Uuid,
    pub action: String,
    pub details: serde_json::Value,
}

impl CreateAdminLogRequest {
    pub fn new(admin_id: Uuid, action: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            admin_id,
            action: action.into(),
            details,
        }
    }
}

/// Query of the logs page
#[derive(Debug, Clone, Default)]
pub struct AdminLogFilter {
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: i64,
}
