//! Attendance desk console
//!
//! Check-ins go through `/api/check-in`, open to organizers and admins. The
//! attendance view is an admin route. The console never patches its cached
//! view: each check-in drops the cache and tries to fetch it again, and a
//! failed refetch leaves the cache empty without failing the check-in.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use crate::client::api::ApiClient;
use crate::models::CheckInTarget;
use crate::services::AttendanceView;
use crate::utils::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckInReply {
    pub success: bool,
    pub registration_id: Uuid,
    pub already_checked_in: bool,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AttendanceConsole {
    api: ApiClient,
    event_id: Option<Uuid>,
    view: Option<AttendanceView>,
}

impl AttendanceConsole {
    pub fn new(api: ApiClient, event_id: Option<Uuid>) -> Self {
        Self {
            api,
            event_id,
            view: None,
        }
    }

    fn view_path(&self) -> String {
        match self.event_id {
            Some(id) => format!("/api/admin/attendance?event_id={}", id),
            None => "/api/admin/attendance".to_string(),
        }
    }

    /// Cached view, fetched on first use
    pub async fn view(&mut self) -> Result<&AttendanceView> {
        let view = match self.view.take() {
            Some(view) => view,
            None => self.api.get_json(&self.view_path()).await?,
        };
        Ok(self.view.insert(view))
    }

    pub async fn refresh(&mut self) -> Result<&AttendanceView> {
        let view: AttendanceView = self.api.get_json(&self.view_path()).await?;
        Ok(self.view.insert(view))
    }

    /// Cached view, if the last fetch succeeded
    pub fn cached(&self) -> Option<&AttendanceView> {
        self.view.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.view = None;
    }

    pub async fn check_in(&mut self, target: CheckInTarget) -> Result<CheckInReply> {
        let body = match &target {
            CheckInTarget::EntryCode(code) => json!({"entry_code": code}),
            CheckInTarget::RegistrationId(id) => json!({"registration_id": id}),
        };

        let reply: CheckInReply = self.api.post_json("/api/check-in", &body).await?;
        info!(
            registration_id = %reply.registration_id,
            already_checked_in = reply.already_checked_in,
            "Check-in recorded"
        );

        self.invalidate();
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Attendance view not refreshed after check-in");
        }
        Ok(reply)
    }
}
