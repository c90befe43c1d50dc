//! Registration from the student's side
//!
//! Answers are checked locally first. File answers are then uploaded, and only
//! after every upload succeeds is the registration itself submitted.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use crate::client::api::ApiClient;
use crate::models::{Answer, FormField};
use crate::services::registration::validate_answers;
use crate::services::{RegisterResponse, StoredFile};
use crate::utils::errors::{CampusEventsError, Result};

/// File picked for a file field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// One answer as entered in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAnswer {
    Text { field_id: Uuid, value: String },
    File { field_id: Uuid, file: FileAttachment },
}

impl DraftAnswer {
    pub fn text(field_id: Uuid, value: impl Into<String>) -> Self {
        DraftAnswer::Text {
            field_id,
            value: value.into(),
        }
    }

    pub fn field_id(&self) -> Uuid {
        match self {
            DraftAnswer::Text { field_id, .. } | DraftAnswer::File { field_id, .. } => *field_id,
        }
    }

    /// Value used for local validation; an attached file counts by its name
    fn local_value(&self) -> String {
        match self {
            DraftAnswer::Text { value, .. } => value.clone(),
            DraftAnswer::File { file, .. } if file.data.is_empty() => String::new(),
            DraftAnswer::File { file, .. } => file.file_name.clone(),
        }
    }
}

/// Event as returned by `GET /api/events/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct PublicEvent {
    pub id: Uuid,
    pub title: String,
    pub is_paid: bool,
    pub price: f64,
    pub remaining: i64,
    pub registration_open: bool,
    pub form_fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    Confirmed {
        registration_id: Uuid,
        ticket_path: String,
    },
    PaymentRequired {
        registration_id: Uuid,
        order_id: String,
        amount: f64,
        razorpay_key: String,
    },
}

impl TryFrom<RegisterResponse> for RegistrationOutcome {
    type Error = CampusEventsError;

    fn try_from(response: RegisterResponse) -> Result<Self> {
        if response.free {
            return Ok(RegistrationOutcome::Confirmed {
                registration_id: response.registration_id,
                ticket_path: format!("/tickets/{}", response.registration_id),
            });
        }

        match (response.order_id, response.amount, response.razorpay_key) {
            (Some(order_id), Some(amount), Some(razorpay_key)) => Ok(RegistrationOutcome::PaymentRequired {
                registration_id: response.registration_id,
                order_id,
                amount,
                razorpay_key,
            }),
            _ => Err(CampusEventsError::PaymentGateway("Incomplete payment details".to_string())),
        }
    }
}

/// Check answers the way the form does before anything is sent
pub fn validate_draft(fields: &[FormField], answers: &[DraftAnswer]) -> Result<()> {
    let local: Vec<Answer> = answers
        .iter()
        .map(|a| Answer {
            field_id: a.field_id(),
            value: a.local_value(),
        })
        .collect();

    validate_answers(fields, &local).map_err(|v| CampusEventsError::Validation(v.client_message()))
}

#[derive(Debug, Clone)]
pub struct RegistrationClient {
    api: ApiClient,
    payments_enabled: bool,
}

impl RegistrationClient {
    pub fn new(api: ApiClient, payments_enabled: bool) -> Self {
        Self { api, payments_enabled }
    }

    /// Submission endpoint for the configured payment mode
    pub fn endpoint(&self) -> &'static str {
        if self.payments_enabled {
            "/api/register-event"
        } else {
            "/api/register-event-test"
        }
    }

    pub async fn load_event(&self, event_id: Uuid) -> Result<PublicEvent> {
        self.api.get_json(&format!("/api/events/{}", event_id)).await
    }

    async fn upload(&self, event_id: Uuid, field_id: Uuid, file: FileAttachment) -> Result<StoredFile> {
        let mut part = Part::bytes(file.data).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .text("event_id", event_id.to_string())
            .text("field_id", field_id.to_string())
            .part("file", part);

        self.api.post_multipart("/api/uploads", form).await
    }

    pub async fn submit(&self, event_id: Uuid, fields: &[FormField], answers: Vec<DraftAnswer>) -> Result<RegistrationOutcome> {
        validate_draft(fields, &answers)?;

        let mut submitted = Vec::with_capacity(answers.len());
        for answer in answers {
            match answer {
                DraftAnswer::Text { field_id, value } => submitted.push(json!({"field_id": field_id, "value": value})),
                DraftAnswer::File { file, .. } if file.data.is_empty() => {}
                DraftAnswer::File { field_id, file } => {
                    let stored = self.upload(event_id, field_id, file).await?;
                    submitted.push(json!({"field_id": field_id, "value": stored.url}));
                }
            }
        }

        let response: RegisterResponse = self
            .api
            .post_json(self.endpoint(), &json!({"event_id": event_id, "answers": submitted}))
            .await?;

        info!(event_id = %event_id, registration_id = %response.registration_id, free = response.free, "Registration submitted");
        RegistrationOutcome::try_from(response)
    }
}

