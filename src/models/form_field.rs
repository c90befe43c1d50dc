//! Custom registration form field model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const FORM_FIELD_COLUMNS: &str = "id, event_id, label, field_type, required, options, position, disabled, \
    disabled_by, disabled_at, original_required, overridden_by, overridden_at, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormField {
    pub id: Uuid,
    pub event_id: Uuid,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub options: Option<Json<Vec<String>>>,
    pub position: i32,
    pub disabled: bool,
    pub disabled_by: Option<Uuid>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub original_required: Option<bool>,
    pub overridden_by: Option<Uuid>,
    pub overridden_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FormField {
    pub fn kind(&self) -> FieldType {
        self.field_type.parse().unwrap_or(FieldType::Text)
    }

    pub fn options(&self) -> &[String] {
        self.options.as_ref().map(|o| o.0.as_slice()).unwrap_or(&[])
    }

    /// Baseline requirement before any admin override
    pub fn baseline_required(&self) -> bool {
        self.original_required.unwrap_or(self.required)
    }
}

/// Field definition as sent by the event editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFieldInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFormFieldRequest {
    pub event_id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Vec<String>,
    pub position: i32,
}

/// Complete new state of an existing field row
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFormFieldRequest {
    pub id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Vec<String>,
    pub position: i32,
    pub disabled: bool,
    pub disabled_by: Option<Uuid>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub original_required: Option<bool>,
    pub overridden_by: Option<Uuid>,
    pub overridden_at: Option<DateTime<Utc>>,
}

/// Row changes that bring an event's stored fields in line with an edited form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldReconciliation {
    pub updates: Vec<UpdateFormFieldRequest>,
    pub inserts: Vec<CreateFormFieldRequest>,
}

impl FieldReconciliation {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Field as listed on the form control page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormFieldControlRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub field: FormField,
    pub event_title: String,
    pub response_count: i64,
}

impl FormFieldControlRow {
    pub fn status_label(&self) -> &'static str {
        if self.field.disabled {
            "DISABLED"
        } else {
            "ACTIVE"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    File,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::File => "file",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "select" => Ok(FieldType::Select),
            "file" => Ok(FieldType::File),
            other => Err(format!("Unknown field type: {}", other)),
        }
    }
}
