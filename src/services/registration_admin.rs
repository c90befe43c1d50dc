//! Admin listing and status changes of registrations

use std::str::FromStr;
use serde_json::json;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{Profile, Registration, RegistrationFilter, RegistrationListRow, RegistrationStatus};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    Confirm,
    Cancel,
    ForceConfirm,
}

impl RegistrationAction {
    pub fn log_action(&self) -> &'static str {
        match self {
            RegistrationAction::Confirm => "REG_CONFIRM",
            RegistrationAction::Cancel => "REG_CANCEL",
            RegistrationAction::ForceConfirm => "REG_FORCE_CONFIRM",
        }
    }

    /// Status after applying the action to a registration in `current`
    ///
    /// A plain confirm only moves PENDING registrations; force_confirm and
    /// cancel apply from any status.
    pub fn target_status(&self, current: RegistrationStatus) -> Result<RegistrationStatus> {
        match (self, current) {
            (RegistrationAction::Confirm, RegistrationStatus::Pending) => Ok(RegistrationStatus::Confirmed),
            (RegistrationAction::Confirm, other) => Err(CampusEventsError::InvalidStateTransition {
                from: other.to_string(),
                to: RegistrationStatus::Confirmed.to_string(),
            }),
            (RegistrationAction::Cancel, _) => Ok(RegistrationStatus::Cancelled),
            (RegistrationAction::ForceConfirm, _) => Ok(RegistrationStatus::Confirmed),
        }
    }
}

impl FromStr for RegistrationAction {
    type Err = CampusEventsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "confirm" => Ok(RegistrationAction::Confirm),
            "cancel" => Ok(RegistrationAction::Cancel),
            "force_confirm" => Ok(RegistrationAction::ForceConfirm),
            other => Err(CampusEventsError::Validation(format!("Unknown action: {}", other))),
        }
    }
}

#[derive(Clone)]
pub struct RegistrationAdminService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl RegistrationAdminService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    pub async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<RegistrationListRow>> {
        self.db.registrations.list(filter).await
    }

    pub async fn apply(&self, admin: &Profile, registration_id: Uuid, action: RegistrationAction) -> Result<Registration> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("Registration not found".to_string()))?;

        let previous = registration.status();
        let next = action.target_status(previous)?;
        let updated = self.db.registrations.update_status(registration.id, next).await?;

        self.audit
            .record(
                admin.id,
                action.log_action(),
                json!({
                    "registration_id": registration.id,
                    "event_id": registration.event_id,
                    "user_id": registration.user_id,
                    "previous_status": previous.as_str(),
                    "new_status": next.as_str(),
                }),
            )
            .await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_confirm_only_from_pending() {
        assert_eq!(
            RegistrationAction::Confirm.target_status(RegistrationStatus::Pending).unwrap(),
            RegistrationStatus::Confirmed
        );
        assert_matches!(
            RegistrationAction::Confirm.target_status(RegistrationStatus::Cancelled),
            Err(CampusEventsError::InvalidStateTransition { .. })
        );
    }

    #[test]
    fn test_force_confirm_and_cancel_from_any_status() {
        for status in [RegistrationStatus::Pending, RegistrationStatus::Confirmed, RegistrationStatus::Cancelled] {
            assert_eq!(
                RegistrationAction::ForceConfirm.target_status(status).unwrap(),
                RegistrationStatus::Confirmed
            );
            assert_eq!(
                RegistrationAction::Cancel.target_status(status).unwrap(),
                RegistrationStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_action_names() {
        assert_eq!("force_confirm".parse::<RegistrationAction>().unwrap().log_action(), "REG_FORCE_CONFIRM");
        assert!("refund".parse::<RegistrationAction>().is_err());
    }
}
