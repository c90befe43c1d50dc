//! Live control of form fields on published events

use std::str::FromStr;
use serde_json::json;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{FormField, FormFieldControlRow, Profile};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControlAction {
    Disable,
    Enable,
    OverrideRequired { required: bool },
    RemoveOverride,
}

impl FieldControlAction {
    /// Parse the form action; `required` only matters for overrides and defaults to true
    pub fn parse(action: &str, required: Option<&str>) -> Result<Self> {
        match action.trim() {
            "disable_field" => Ok(FieldControlAction::Disable),
            "enable_field" => Ok(FieldControlAction::Enable),
            "override_field_required" => Ok(FieldControlAction::OverrideRequired {
                required: required
                    .map(|v| matches!(v.trim(), "true" | "on" | "1" | "yes"))
                    .unwrap_or(true),
            }),
            "remove_field_override" => Ok(FieldControlAction::RemoveOverride),
            other => Err(CampusEventsError::Validation(format!("Unknown action: {}", other))),
        }
    }

    pub fn form_name(&self) -> &'static str {
        match self {
            FieldControlAction::Disable => "disable_field",
            FieldControlAction::Enable => "enable_field",
            FieldControlAction::OverrideRequired { .. } => "override_field_required",
            FieldControlAction::RemoveOverride => "remove_field_override",
        }
    }

    pub fn log_action(&self) -> &'static str {
        match self {
            FieldControlAction::Disable => "FORM_FIELD_DISABLE",
            FieldControlAction::Enable => "FORM_FIELD_ENABLE",
            FieldControlAction::OverrideRequired { .. } => "FORM_FIELD_OVERRIDE_REQUIRED",
            FieldControlAction::RemoveOverride => "FORM_FIELD_REMOVE_OVERRIDE",
        }
    }
}

impl FromStr for FieldControlAction {
    type Err = CampusEventsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, None)
    }
}

#[derive(Clone)]
pub struct FormControlService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl FormControlService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    /// Fields of approved events; disabled fields stay listed with their responses
    pub async fn list(&self) -> Result<Vec<FormFieldControlRow>> {
        self.db.form_fields.list_for_control().await
    }

    pub async fn apply(
        &self,
        admin: &Profile,
        event_id: Uuid,
        field_id: Uuid,
        action: FieldControlAction,
    ) -> Result<FormField> {
        let field = self
            .db
            .form_fields
            .find_by_id(field_id)
            .await?
            .filter(|f| f.event_id == event_id)
            .ok_or_else(|| CampusEventsError::NotFound("Form field not found".to_string()))?;

        let updated = match action {
            FieldControlAction::Disable => self.db.form_fields.set_disabled(field.id, true, admin.id).await?,
            FieldControlAction::Enable => self.db.form_fields.set_disabled(field.id, false, admin.id).await?,
            FieldControlAction::OverrideRequired { required } => {
                self.db.form_fields.override_required(field.id, required, admin.id).await?
            }
            FieldControlAction::RemoveOverride => self.db.form_fields.remove_override(field.id).await?,
        };

        self.audit
            .record(
                admin.id,
                action.log_action(),
                json!({
                    "event_id": event_id,
                    "field_id": field_id,
                    "action": action.form_name(),
                    "label": field.label,
                    "required": {"old": field.required, "new": updated.required},
                    "disabled": {"old": field.disabled, "new": updated.disabled},
                }),
            )
            .await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("disable_field".parse::<FieldControlAction>().unwrap(), FieldControlAction::Disable);
        assert_eq!(
            FieldControlAction::parse("override_field_required", None).unwrap(),
            FieldControlAction::OverrideRequired { required: true }
        );
        assert_eq!(
            FieldControlAction::parse("override_field_required", Some("false")).unwrap(),
            FieldControlAction::OverrideRequired { required: false }
        );
        assert!("drop_field".parse::<FieldControlAction>().is_err());
    }

    #[test]
    fn test_log_actions() {
        assert_eq!(FieldControlAction::RemoveOverride.log_action(), "FORM_FIELD_REMOVE_OVERRIDE");
        assert_eq!(FieldControlAction::Enable.form_name(), "enable_field");
    }
}
