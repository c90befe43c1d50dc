//! Registration submission
//!
//! The flow for one submission is: load the active fields, validate the answers,
//! run the capacity-checked `register_for_event` procedure, store the answers,
//! then either confirm the registration or open a gateway order.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::config::PaymentsConfig;
use crate::database::DatabaseService;
use crate::models::{Answer, CreatePaymentRequest, Event, FieldType, FormField, RegistrationStatus};
use crate::services::payments::{receipt_for, to_paise, PaymentGateway};
use crate::services::storage::{FileStorage, StoredFile};
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::helpers::registration_file_key;
use crate::utils::logging::log_registration_event;

/// Largest file accepted for a file field
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Why a set of answers does not satisfy an event's form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerViolation {
    MissingRequired { label: String, field_type: FieldType },
    InvalidOption { label: String },
    InvalidNumber { label: String },
    UnknownField { field_id: Uuid },
}

impl AnswerViolation {
    /// Message shown next to the form before anything is sent
    pub fn client_message(&self) -> String {
        match self {
            AnswerViolation::MissingRequired { label, field_type: FieldType::File } => {
                format!("Please upload a file for \"{}\"", label)
            }
            AnswerViolation::MissingRequired { label, .. } => format!("Please fill out \"{}\"", label),
            AnswerViolation::InvalidOption { label } => format!("Please choose a valid option for \"{}\"", label),
            AnswerViolation::InvalidNumber { label } => format!("Please enter a number for \"{}\"", label),
            AnswerViolation::UnknownField { .. } => "Unknown form field".to_string(),
        }
    }

    /// Message returned by the registration endpoints
    pub fn server_message(&self) -> &'static str {
        match self {
            AnswerViolation::MissingRequired { .. } => "Missing required field response",
            AnswerViolation::InvalidOption { .. } => "Invalid option selected",
            AnswerViolation::InvalidNumber { .. } => "Invalid number",
            AnswerViolation::UnknownField { .. } => "Unknown form field",
        }
    }
}

/// Check answers against the active (non-disabled) fields of an event
///
/// Answers are compared trimmed; a blank answer counts as missing.
pub fn validate_answers(fields: &[FormField], answers: &[Answer]) -> std::result::Result<(), AnswerViolation> {
    let active: HashMap<Uuid, &FormField> = fields
        .iter()
        .filter(|f| !f.disabled)
        .map(|f| (f.id, f))
        .collect();

    for answer in answers {
        if !active.contains_key(&answer.field_id) {
            return Err(AnswerViolation::UnknownField { field_id: answer.field_id });
        }
    }

    let mut by_field: HashMap<Uuid, &str> = HashMap::new();
    for answer in answers {
        let value = answer.value.trim();
        if !value.is_empty() {
            by_field.insert(answer.field_id, value);
        }
    }

    let mut ordered: Vec<&FormField> = active.values().copied().collect();
    ordered.sort_by_key(|f| f.position);

    for field in ordered {
        match by_field.get(&field.id) {
            None if field.required => {
                return Err(AnswerViolation::MissingRequired {
                    label: field.label.clone(),
                    field_type: field.kind(),
                });
            }
            Some(value) if field.kind() == FieldType::Select => {
                if !field.options().iter().any(|o| o == value) {
                    return Err(AnswerViolation::InvalidOption { label: field.label.clone() });
                }
            }
            Some(value) if field.kind() == FieldType::Number => {
                if !value.parse::<f64>().is_ok_and(f64::is_finite) {
                    return Err(AnswerViolation::InvalidNumber { label: field.label.clone() });
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Trim answers and drop the blank ones
pub fn normalize_answers(answers: Vec<Answer>) -> Vec<Answer> {
    answers
        .into_iter()
        .filter_map(|a| {
            let value = a.value.trim();
            (!value.is_empty()).then(|| Answer {
                field_id: a.field_id,
                value: value.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct AnswerInput {
    field_id: Uuid,
    #[serde(default)]
    value: Value,
}

/// Parsed body of a registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub event_id: Uuid,
    pub answers: Vec<Answer>,
}

impl RegisterRequest {
    /// Parse `{event_id, answers: [{field_id, value}]}`
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let body: Value = serde_json::from_slice(body)
            .map_err(|_| CampusEventsError::Validation("Invalid body".to_string()))?;

        let event_id = match body.get("event_id") {
            None | Some(Value::Null) => return Err(CampusEventsError::Validation("Missing event_id".to_string())),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(CampusEventsError::Validation("Missing event_id".to_string()))
            }
            Some(Value::String(s)) => Uuid::parse_str(s.trim())
                .map_err(|_| CampusEventsError::Validation("Invalid event_id".to_string()))?,
            Some(_) => return Err(CampusEventsError::Validation("Invalid event_id".to_string())),
        };

        let answers = match body.get("answers") {
            Some(Value::Array(items)) => {
                let inputs: Vec<AnswerInput> = serde_json::from_value(Value::Array(items.clone()))
                    .map_err(|_| CampusEventsError::Validation("Invalid answers".to_string()))?;
                inputs
                    .into_iter()
                    .map(|a| Answer {
                        field_id: a.field_id,
                        value: match a.value {
                            Value::String(s) => s,
                            Value::Null => String::new(),
                            other => other.to_string(),
                        },
                    })
                    .collect()
            }
            _ => Vec::new(),
        };

        Ok(Self { event_id, answers })
    }
}

/// Which confirmation path a submission takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Paid events open a gateway order when payments are enabled
    Standard,
    /// Always confirm immediately
    AlwaysConfirm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub free: bool,
    pub registration_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Price in rupees; the checkout widget converts to paise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_key: Option<String>,
}

impl RegisterResponse {
    fn confirmed(registration_id: Uuid) -> Self {
        Self {
            success: true,
            free: true,
            registration_id,
            order_id: None,
            amount: None,
            razorpay_key: None,
        }
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    db: DatabaseService,
    payments: PaymentsConfig,
    gateway: Option<Arc<dyn PaymentGateway>>,
    storage: FileStorage,
}

impl RegistrationService {
    pub fn new(
        db: DatabaseService,
        payments: PaymentsConfig,
        gateway: Option<Arc<dyn PaymentGateway>>,
        storage: FileStorage,
    ) -> Self {
        Self {
            db,
            payments,
            gateway,
            storage,
        }
    }

    pub fn payments_enabled(&self) -> bool {
        self.payments.enabled
    }

    pub async fn register(&self, user_id: Uuid, request: RegisterRequest, mode: ConfirmMode) -> Result<RegisterResponse> {
        if let Some(profile) = self.db.profiles.find_by_id(user_id).await? {
            if profile.disabled {
                return Err(CampusEventsError::PermissionDenied("Account disabled".to_string()));
            }
        }

        let event = self
            .db
            .events
            .find_by_id(request.event_id)
            .await?
            .ok_or_else(|| CampusEventsError::RegistrationFailed("Event not found".to_string()))?;

        let fields = self.db.form_fields.list_active_for_event(event.id).await?;
        if let Err(violation) = validate_answers(&fields, &request.answers) {
            warn!(event_id = %event.id, user_id = %user_id, violation = ?violation, "Registration answers rejected");
            return Err(CampusEventsError::Validation(violation.server_message().to_string()));
        }

        let registration_id = self.db.registrations.register_for_event(event.id, user_id).await?;
        log_registration_event(registration_id, event.id, user_id, "registered");

        match self.complete(&event, user_id, registration_id, request.answers, mode).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // The PENDING row holds a seat until it is cancelled
                error!(registration_id = %registration_id, error = %e, "Registration not completed, cancelling");
                if let Err(cancel_error) = self
                    .db
                    .registrations
                    .update_status(registration_id, RegistrationStatus::Cancelled)
                    .await
                {
                    error!(registration_id = %registration_id, error = %cancel_error, "Failed to cancel registration");
                }
                log_registration_event(registration_id, event.id, user_id, "cancelled");
                Err(e)
            }
        }
    }

    /// Everything after the seat is taken: answers, then confirmation or a gateway order
    async fn complete(
        &self,
        event: &Event,
        user_id: Uuid,
        registration_id: Uuid,
        answers: Vec<Answer>,
        mode: ConfirmMode,
    ) -> Result<RegisterResponse> {
        let answers = normalize_answers(answers);
        let stored = self.db.registrations.insert_responses(registration_id, &answers).await?;
        info!(registration_id = %registration_id, responses = stored, "Registration responses stored");

        let needs_payment = mode == ConfirmMode::Standard && self.payments.enabled && event.is_paid && event.price > 0.0;
        if !needs_payment {
            self.db.registrations.confirm(registration_id).await?;
            log_registration_event(registration_id, event.id, user_id, "confirmed");
            return Ok(RegisterResponse::confirmed(registration_id));
        }

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| CampusEventsError::ServiceUnavailable("Payment gateway is not configured".to_string()))?;

        let order = gateway
            .create_order(to_paise(event.price), &event.currency, &receipt_for(registration_id))
            .await?;

        self.db
            .payments
            .create(CreatePaymentRequest {
                registration_id,
                event_id: event.id,
                user_id,
                amount: event.price,
                currency: event.currency.clone(),
                razorpay_order_id: order.id.clone(),
            })
            .await?;
        log_registration_event(registration_id, event.id, user_id, "payment_initiated");

        Ok(RegisterResponse {
            success: true,
            free: false,
            registration_id,
            order_id: Some(order.id),
            amount: Some(event.price),
            razorpay_key: Some(gateway.public_key().to_string()),
        })
    }

    /// Store a file answer ahead of submission and return its public URL
    pub async fn upload_answer_file(
        &self,
        event_id: Uuid,
        field_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<StoredFile> {
        if data.is_empty() {
            return Err(CampusEventsError::Validation("File is empty".to_string()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(CampusEventsError::Validation("File is too large".to_string()));
        }

        let field = self
            .db
            .form_fields
            .find_by_id(field_id)
            .await?
            .filter(|f| f.event_id == event_id && !f.disabled)
            .ok_or_else(|| CampusEventsError::Validation("Unknown form field".to_string()))?;

        if field.kind() != FieldType::File {
            return Err(CampusEventsError::Validation("Field does not accept files".to_string()));
        }

        let key = registration_file_key(event_id, field_id, file_name, Utc::now());
        let stored = self.storage.put(&key, data, content_type).await?;
        info!(event_id = %event_id, field_id = %field_id, path = %stored.path, "Registration file uploaded");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn field(label: &str, field_type: FieldType, required: bool, options: &[&str], position: i32) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            label: label.to_string(),
            field_type: field_type.as_str().to_string(),
            required,
            options: (!options.is_empty()).then(|| Json(options.iter().map(|o| o.to_string()).collect())),
            position,
            disabled: false,
            disabled_by: None,
            disabled_at: None,
            original_required: Some(required),
            overridden_by: None,
            overridden_at: None,
            created_at: Utc::now(),
        }
    }

    fn answer(field: &FormField, value: &str) -> Answer {
        Answer {
            field_id: field.id,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_blank_required_answer_is_rejected() {
        let name = field("Full Name", FieldType::Text, true, &[], 0);
        let violation = validate_answers(&[name.clone()], &[answer(&name, "   ")]).unwrap_err();

        assert_eq!(violation.client_message(), "Please fill out \"Full Name\"");
        assert_eq!(violation.server_message(), "Missing required field response");
    }

    #[test]
    fn test_missing_file_uses_upload_message() {
        let id_card = field("ID Card", FieldType::File, true, &[], 0);
        let violation = validate_answers(&[id_card], &[]).unwrap_err();

        assert_eq!(violation.client_message(), "Please upload a file for \"ID Card\"");
    }

    #[test]
    fn test_number_field_needs_a_number() {
        let year = field("Year of Study", FieldType::Number, true, &[], 0);

        let violation = validate_answers(&[year.clone()], &[answer(&year, "second")]).unwrap_err();
        assert_eq!(violation.client_message(), "Please enter a number for \"Year of Study\"");
        assert_eq!(violation.server_message(), "Invalid number");

        assert!(validate_answers(&[year.clone()], &[answer(&year, "NaN")]).is_err());
        assert!(validate_answers(&[year.clone()], &[answer(&year, " 2 ")]).is_ok());
        assert!(validate_answers(&[year.clone()], &[answer(&year, "3.5")]).is_ok());
    }

    #[test]
    fn test_optional_number_may_be_blank() {
        let year = field("Year of Study", FieldType::Number, false, &[], 0);
        assert!(validate_answers(&[year.clone()], &[answer(&year, "  ")]).is_ok());
    }

    #[test]
    fn test_select_must_match_declared_option() {
        let size = field("T-shirt Size", FieldType::Select, true, &["S", "M", "L"], 0);

        let violation = validate_answers(&[size.clone()], &[answer(&size, "XL")]).unwrap_err();
        assert_eq!(violation.client_message(), "Please choose a valid option for \"T-shirt Size\"");
        assert_eq!(violation.server_message(), "Invalid option selected");

        assert!(validate_answers(&[size.clone()], &[answer(&size, " M ")]).is_ok());
    }

    #[test]
    fn test_disabled_and_unknown_fields() {
        let mut legacy = field("Legacy", FieldType::Text, true, &[], 0);
        legacy.disabled = true;

        // A disabled required field does not block submission
        assert!(validate_answers(&[legacy.clone()], &[]).is_ok());

        let violation = validate_answers(&[legacy.clone()], &[answer(&legacy, "x")]).unwrap_err();
        assert_eq!(violation.server_message(), "Unknown form field");
    }

    #[test]
    fn test_first_missing_field_by_position_is_reported() {
        let second = field("Department", FieldType::Text, true, &[], 1);
        let first = field("Roll Number", FieldType::Number, true, &[], 0);

        let violation = validate_answers(&[second, first], &[]).unwrap_err();
        assert_eq!(violation.client_message(), "Please fill out \"Roll Number\"");
    }

    #[test]
    fn test_normalize_answers() {
        let id = Uuid::new_v4();
        let answers = vec![
            Answer { field_id: id, value: "  CSE ".to_string() },
            Answer { field_id: Uuid::new_v4(), value: "   ".to_string() },
        ];

        assert_eq!(normalize_answers(answers), vec![Answer { field_id: id, value: "CSE".to_string() }]);
    }

    #[test]
    fn test_parse_register_body() {
        let event_id = Uuid::new_v4();
        let field_id = Uuid::new_v4();
        let body = serde_json::json!({
            "event_id": event_id,
            "answers": [{"field_id": field_id, "value": 42}]
        });

        let request = RegisterRequest::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.event_id, event_id);
        assert_eq!(request.answers, vec![Answer { field_id, value: "42".to_string() }]);
    }

    #[test]
    fn test_parse_register_body_errors() {
        let err = RegisterRequest::from_slice(b"{not json").unwrap_err();
        assert_eq!(err.to_string(), "Invalid body");

        let err = RegisterRequest::from_slice(br#"{"answers": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing event_id");

        let request = RegisterRequest::from_slice(format!(r#"{{"event_id": "{}", "answers": "x"}}"#, Uuid::nil()).as_bytes()).unwrap();
        assert!(request.answers.is_empty());
    }
}
