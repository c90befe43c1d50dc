//! Role management and account disabling

use std::str::FromStr;
use serde_json::json;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{Profile, Role};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Promote,
    Demote,
    Disable,
    Enable,
}

impl FromStr for UserAction {
    type Err = CampusEventsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "promote" | "promote_student_to_organizer" | "promote_organizer_to_admin" => Ok(UserAction::Promote),
            "demote" | "demote_admin_to_organizer" | "demote_organizer_to_student" => Ok(UserAction::Demote),
            "disable_user" => Ok(UserAction::Disable),
            "enable_user" => Ok(UserAction::Enable),
            other => Err(CampusEventsError::Validation(format!("Unknown action: {}", other))),
        }
    }
}

/// Next role and the log action of a promotion or demotion
pub fn plan_role_change(action: UserAction, current: Role) -> Result<(Role, &'static str)> {
    let planned = match (action, current) {
        (UserAction::Promote, Role::Student) => Some((Role::Organizer, "ROLE_PROMOTE_STUDENT_TO_ORGANIZER")),
        (UserAction::Promote, Role::Organizer) => Some((Role::Admin, "ROLE_PROMOTE_ORGANIZER_TO_ADMIN")),
        (UserAction::Demote, Role::Admin) => Some((Role::Organizer, "ROLE_DEMOTE_ADMIN_TO_ORGANIZER")),
        (UserAction::Demote, Role::Organizer) => Some((Role::Student, "ROLE_DEMOTE_ORGANIZER_TO_STUDENT")),
        _ => None,
    };

    planned.ok_or_else(|| CampusEventsError::InvalidStateTransition {
        from: current.to_string(),
        to: format!("{:?}", action).to_lowercase(),
    })
}

#[derive(Clone)]
pub struct UserAdminService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl UserAdminService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    pub async fn list(&self, role: Option<Role>, search: Option<&str>) -> Result<Vec<Profile>> {
        self.db.profiles.list(role, search).await
    }

    pub async fn apply(&self, admin: &Profile, target_id: Uuid, action: UserAction) -> Result<Profile> {
        if target_id == admin.id {
            return Err(CampusEventsError::PermissionDenied(
                "Admins cannot change their own account".to_string(),
            ));
        }

        let target = self
            .db
            .profiles
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("User not found".to_string()))?;

        let (updated, log_action, details) = match action {
            UserAction::Promote | UserAction::Demote => {
                let previous = target.role();
                let (next, log_action) = plan_role_change(action, previous)?;
                let updated = self.db.profiles.update_role(target.id, next).await?;
                let details = json!({
                    "target_user_id": target.id,
                    "previous_role": previous.as_str(),
                    "new_role": next.as_str(),
                });
                (updated, log_action, details)
            }
            UserAction::Disable | UserAction::Enable => {
                let disabled = action == UserAction::Disable;
                let updated = self.db.profiles.set_disabled(target.id, disabled).await?;
                let log_action = if disabled { "USER_DISABLE" } else { "USER_ENABLE" };
                (updated, log_action, json!({"target_user_id": target.id, "disabled": disabled}))
            }
        };

        self.audit.record(admin.id, log_action, details).await?;
        Ok(updated)
    }
}
