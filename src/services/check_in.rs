//! Check-in of confirmed registrations
//!
//! At most one attendance row exists per registration; repeating a check-in
//! reports the original timestamp instead of failing.

use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{Attendance, CheckInOutcome, CheckInTarget, Profile, Registration, RegistrationStatus};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::logging::log_check_in;

pub const ACTION_CHECKIN: &str = "ATTENDANCE_CHECKIN";
pub const ACTION_UNDO: &str = "ATTENDANCE_UNDO";

#[derive(Debug, Deserialize)]
struct CheckInBody {
    #[serde(default)]
    entry_code: Option<String>,
    #[serde(default)]
    registration_id: Option<String>,
}

impl CheckInTarget {
    /// Exactly one of `entry_code` and `registration_id` must be given
    pub fn from_parts(entry_code: Option<&str>, registration_id: Option<&str>) -> Result<Self> {
        let entry_code = entry_code.map(str::trim).filter(|v| !v.is_empty());
        let registration_id = registration_id.map(str::trim).filter(|v| !v.is_empty());

        match (entry_code, registration_id) {
            (Some(code), None) => Ok(CheckInTarget::EntryCode(code.to_string())),
            (None, Some(id)) => Uuid::parse_str(id)
                .map(CheckInTarget::RegistrationId)
                .map_err(|_| CampusEventsError::Validation("Invalid registration_id".to_string())),
            (None, None) => Err(CampusEventsError::Validation(
                "Provide either entry_code or registration_id".to_string(),
            )),
            (Some(_), Some(_)) => Err(CampusEventsError::Validation(
                "Provide only one of entry_code or registration_id".to_string(),
            )),
        }
    }

    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let body: CheckInBody = serde_json::from_slice(body)
            .map_err(|_| CampusEventsError::Validation("Invalid body".to_string()))?;
        Self::from_parts(body.entry_code.as_deref(), body.registration_id.as_deref())
    }
}

#[derive(Clone)]
pub struct CheckInService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl CheckInService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    async fn lookup(&self, target: &CheckInTarget) -> Result<Registration> {
        let registration = match target {
            CheckInTarget::EntryCode(code) => self.db.registrations.find_by_entry_code(code).await?,
            CheckInTarget::RegistrationId(id) => self.db.registrations.find_by_id(*id).await?,
        };

        registration.ok_or_else(|| CampusEventsError::NotFound("Registration not found".to_string()))
    }

    /// Mark a confirmed registration present
    pub async fn check_in(&self, actor: &Profile, target: CheckInTarget) -> Result<CheckInOutcome> {
        let registration = self.lookup(&target).await?;
        if registration.status() != RegistrationStatus::Confirmed {
            warn!(registration_id = %registration.id, status = %registration.status, "Check-in of unconfirmed registration");
            return Err(CampusEventsError::Validation("Registration is not confirmed".to_string()));
        }

        let (attendance, already_checked_in) = match self
            .db
            .attendance
            .insert_if_absent(registration.id, Some(actor.id))
            .await?
        {
            Some(attendance) => (attendance, false),
            None => {
                let existing = self
                    .db
                    .attendance
                    .find_by_registration(registration.id)
                    .await?
                    .ok_or_else(|| CampusEventsError::ServiceUnavailable("Attendance changed concurrently".to_string()))?;
                (existing, true)
            }
        };

        log_check_in(registration.id, target.method(), already_checked_in);

        if !already_checked_in {
            self.audit
                .record(
                    actor.id,
                    ACTION_CHECKIN,
                    json!({
                        "registration_id": registration.id,
                        "event_id": registration.event_id,
                        "user_id": registration.user_id,
                        "entry_code": registration.entry_code,
                        "method": target.method(),
                    }),
                )
                .await?;
        }

        Ok(CheckInOutcome {
            registration_id: registration.id,
            event_id: registration.event_id,
            entry_code: registration.entry_code,
            already_checked_in,
            checked_in_at: attendance.checked_in_at,
        })
    }

    /// Remove an attendance record
    pub async fn undo(&self, admin: &Profile, registration_id: Uuid) -> Result<Attendance> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("Registration not found".to_string()))?;

        let attendance = self
            .db
            .attendance
            .delete_by_registration(registration_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("Attendance not found".to_string()))?;

        self.audit
            .record(
                admin.id,
                ACTION_UNDO,
                json!({
                    "registration_id": registration.id,
                    "event_id": registration.event_id,
                    "user_id": registration.user_id,
                    "entry_code": registration.entry_code,
                    "checked_in_at": attendance.checked_in_at,
                }),
            )
            .await?;

        Ok(attendance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_requires_exactly_one_identifier() {
        assert_eq!(
            CheckInTarget::from_parts(Some(" MANUAL-1699999999999-AB12CD34E "), None).unwrap(),
            CheckInTarget::EntryCode("MANUAL-1699999999999-AB12CD34E".to_string())
        );

        let id = Uuid::new_v4();
        assert_eq!(
            CheckInTarget::from_parts(None, Some(&id.to_string())).unwrap(),
            CheckInTarget::RegistrationId(id)
        );

        assert!(CheckInTarget::from_parts(None, None).is_err());
        assert!(CheckInTarget::from_parts(Some(""), Some("  ")).is_err());
        assert!(CheckInTarget::from_parts(Some("A1B2"), Some(&id.to_string())).is_err());
        assert!(CheckInTarget::from_parts(None, Some("not-a-uuid")).is_err());
    }

    #[test]
    fn test_target_from_body() {
        let err = CheckInTarget::from_slice(b"[").unwrap_err();
        assert_eq!(err.to_string(), "Invalid body");

        let target = CheckInTarget::from_slice(br#"{"entry_code": "A1B2C3D4E5F6"}"#).unwrap();
        assert_eq!(target.method(), "entry_code");
    }
}
