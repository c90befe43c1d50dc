//! Admin audit trail
//!
//! Every privileged mutation appends one `admin_logs` row. Entries are never
//! updated or deleted.

use std::str::FromStr;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{AdminLog, AdminLogFilter, AdminLogRow, CreateAdminLogRequest, Profile, Role};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

/// Maximum number of entries the log page shows
pub const LOG_PAGE_LIMIT: i64 = 200;

/// Date range filter of the log page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRange {
    Today,
    Week,
    Month,
}

impl FromStr for LogRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(LogRange::Today),
            "week" => Ok(LogRange::Week),
            "month" => Ok(LogRange::Month),
            other => Err(format!("Unknown range: {}", other)),
        }
    }
}

/// Start of a range as seen from `now` in its own timezone
pub fn range_start<Tz: TimeZone>(range: LogRange, now: DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let today = now.date_naive();

    match range {
        LogRange::Today => local_midnight(&tz, today),
        LogRange::Week => (now - Duration::days(7)).with_timezone(&Utc),
        LogRange::Month => local_midnight(&tz, today.with_day(1).unwrap_or(today)),
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub admin: Option<Uuid>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub range: Option<LogRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOption {
    pub id: Uuid,
    pub name: String,
}

impl From<&Profile> for AdminOption {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsView {
    pub logs: Vec<AdminLogRow>,
    pub actions: Vec<String>,
    pub admins: Vec<AdminOption>,
}

#[derive(Clone)]
pub struct AuditLogger {
    db: DatabaseService,
}

impl AuditLogger {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Append an entry and mirror it to the tracing output
    pub async fn record(&self, admin_id: Uuid, action: &str, details: Value) -> Result<AdminLog> {
        let target = details
            .get("registration_id")
            .or_else(|| details.get("event_id"))
            .or_else(|| details.get("target_user_id"))
            .or_else(|| details.get("field_id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let log = self
            .db
            .admin_logs
            .create(CreateAdminLogRequest::new(admin_id, action, details))
            .await?;

        log_admin_action(admin_id, action, target.as_deref());
        Ok(log)
    }

    pub async fn list(&self, query: &LogQuery) -> Result<LogsView> {
        let filter = AdminLogFilter {
            admin_id: query.admin,
            action: query.action.clone().filter(|a| !a.is_empty()),
            since: query.range.map(|r| range_start(r, chrono::Local::now())),
            limit: LOG_PAGE_LIMIT,
        };

        let (logs, actions, admins) = futures::try_join!(
            self.db.admin_logs.list(&filter),
            self.db.admin_logs.distinct_actions(),
            self.db.profiles.list(Some(Role::Admin), None),
        )?;

        Ok(LogsView {
            logs,
            actions,
            admins: admins.iter().map(AdminOption::from).collect(),
        })
    }
}
