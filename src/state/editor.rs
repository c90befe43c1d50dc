//! Admin event editor state
//!
//! The editor keeps a draft of the event and its form, a map of field errors
//! and two UI flags. Every change goes through [`EditorState::dispatch`], so a
//! draft can be replayed from a list of actions.

use std::collections::BTreeMap;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use crate::models::{Event, EventStatus, FieldType, FormField, FormFieldInput, Visibility};
use crate::utils::errors::{CampusEventsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Free,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    #[default]
    Publish,
    Draft,
}

/// One field of the form builder; `id` is a stored field id or a client-side key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftField {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl DraftField {
    pub fn new(label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            id: format!("new-{}", Uuid::new_v4().simple()),
            label: label.to_string(),
            field_type,
            required,
            options: Vec::new(),
            disabled: false,
        }
    }

    /// Stored fields keep their id; client-side keys become new fields
    pub fn to_input(&self) -> FormFieldInput {
        FormFieldInput {
            id: Uuid::parse_str(&self.id).ok(),
            label: self.label.clone(),
            field_type: self.field_type,
            required: self.required,
            options: self.options.clone(),
            disabled: self.disabled,
        }
    }
}

impl From<&FormField> for DraftField {
    fn from(field: &FormField) -> Self {
        Self {
            id: field.id.to_string(),
            label: field.label.clone(),
            field_type: field.kind(),
            required: field.required,
            options: field.options().to_vec(),
            disabled: field.disabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: String,
    pub start_time: String,
    pub end_time: String,
    pub total_capacity: i64,
    pub registration_status: RegistrationState,
    pub auto_close_when_full: bool,
    pub event_type: EventType,
    pub price: f64,
    pub currency: String,
    pub form_fields: Vec<DraftField>,
    pub visibility: Visibility,
    pub save_mode: SaveMode,
    pub assigned_organizer: Option<Uuid>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            event_date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            total_capacity: 1,
            registration_status: RegistrationState::Open,
            auto_close_when_full: true,
            event_type: EventType::Free,
            price: 0.0,
            currency: "INR".to_string(),
            form_fields: Vec::new(),
            visibility: Visibility::Public,
            save_mode: SaveMode::Publish,
            assigned_organizer: None,
        }
    }
}

impl EventDraft {
    /// Draft of a stored event, used as the baseline of an edit
    pub fn from_event(event: &Event, fields: &[FormField]) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            location: event.location.clone().unwrap_or_default(),
            event_date: event.event_date.format("%Y-%m-%d").to_string(),
            start_time: event.start_time.format("%H:%M").to_string(),
            end_time: event.end_time.format("%H:%M").to_string(),
            total_capacity: i64::from(event.capacity),
            registration_status: if event.is_registration_open {
                RegistrationState::Open
            } else {
                RegistrationState::Closed
            },
            auto_close_when_full: event.auto_close_when_full,
            event_type: if event.is_paid { EventType::Paid } else { EventType::Free },
            price: event.price,
            currency: event.currency.clone(),
            form_fields: fields.iter().map(DraftField::from).collect(),
            visibility: event.visibility.parse().unwrap_or_default(),
            save_mode: if event.status() == EventStatus::Draft {
                SaveMode::Draft
            } else {
                SaveMode::Publish
            },
            assigned_organizer: event.assigned_organizer,
        }
    }

    /// Body of `POST /api/admin/update-event`
    pub fn update_payload(&self, event_id: Uuid, allow_capacity_override: bool) -> Value {
        let paid = self.event_type == EventType::Paid;
        json!({
            "event_id": event_id,
            "allow_capacity_override": allow_capacity_override,
            "event": {
                "title": self.title.trim(),
                "description": self.description.trim(),
                "location": self.location.trim(),
                "event_date": self.event_date,
                "start_time": self.start_time,
                "end_time": self.end_time,
                "capacity": self.total_capacity,
                "registration_status": self.registration_status,
                "auto_close_when_full": self.auto_close_when_full,
                "event_type": self.event_type,
                "price": if paid { self.price } else { 0.0 },
                "save_mode": self.save_mode,
                "visibility": self.visibility,
                "assigned_organizer": self.assigned_organizer,
            },
            "form_fields": self.form_fields.iter().map(DraftField::to_input).collect::<Vec<_>>(),
        })
    }
}

/// Single-field change of the draft
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    Location(String),
    EventDate(String),
    StartTime(String),
    EndTime(String),
    TotalCapacity(i64),
    RegistrationStatus(RegistrationState),
    AutoCloseWhenFull(bool),
    EventType(EventType),
    Price(f64),
    Visibility(Visibility),
    SaveMode(SaveMode),
    AssignedOrganizer(Option<Uuid>),
}

impl FieldUpdate {
    /// Error key the update clears
    pub fn key(&self) -> &'static str {
        match self {
            FieldUpdate::Title(_) => "title",
            FieldUpdate::Description(_) => "description",
            FieldUpdate::Location(_) => "location",
            FieldUpdate::EventDate(_) => "event_date",
            FieldUpdate::StartTime(_) => "start_time",
            FieldUpdate::EndTime(_) => "end_time",
            FieldUpdate::TotalCapacity(_) => "total_capacity",
            FieldUpdate::RegistrationStatus(_) => "registration_status",
            FieldUpdate::AutoCloseWhenFull(_) => "auto_close_when_full",
            FieldUpdate::EventType(_) => "event_type",
            FieldUpdate::Price(_) => "price",
            FieldUpdate::Visibility(_) => "visibility",
            FieldUpdate::SaveMode(_) => "save_mode",
            FieldUpdate::AssignedOrganizer(_) => "assigned_organizer",
        }
    }

    fn apply(self, draft: &mut EventDraft) {
        match self {
            FieldUpdate::Title(v) => draft.title = v,
            FieldUpdate::Description(v) => draft.description = v,
            FieldUpdate::Location(v) => draft.location = v,
            FieldUpdate::EventDate(v) => draft.event_date = v,
            FieldUpdate::StartTime(v) => draft.start_time = v,
            FieldUpdate::EndTime(v) => draft.end_time = v,
            FieldUpdate::TotalCapacity(v) => draft.total_capacity = v,
            FieldUpdate::RegistrationStatus(v) => draft.registration_status = v,
            FieldUpdate::AutoCloseWhenFull(v) => draft.auto_close_when_full = v,
            FieldUpdate::EventType(v) => draft.event_type = v,
            FieldUpdate::Price(v) => draft.price = v,
            FieldUpdate::Visibility(v) => draft.visibility = v,
            FieldUpdate::SaveMode(v) => draft.save_mode = v,
            FieldUpdate::AssignedOrganizer(v) => draft.assigned_organizer = v,
        }
    }
}

/// Partial change of one form-builder field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    UpdateField(FieldUpdate),
    SetError { field: String, message: String },
    ClearError { field: String },
    SetSubmitting(bool),
    ToggleConfirmation,
    AddFormField(DraftField),
    UpdateFormField { id: String, patch: FieldPatch },
    RemoveFormField { id: String },
    MoveFormField { from: usize, to: usize },
    ResetForm,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    pub data: EventDraft,
    pub errors: BTreeMap<String, String>,
    pub is_submitting: bool,
    pub show_confirmation: bool,
}

impl EditorState {
    pub fn new(data: EventDraft) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    pub fn dispatch(&mut self, action: EditorAction) {
        match action {
            EditorAction::UpdateField(update) => {
                self.errors.remove(update.key());
                update.apply(&mut self.data);
            }
            EditorAction::SetError { field, message } => {
                self.errors.insert(field, message);
            }
            EditorAction::ClearError { field } => {
                self.errors.remove(&field);
            }
            EditorAction::SetSubmitting(value) => self.is_submitting = value,
            EditorAction::ToggleConfirmation => self.show_confirmation = !self.show_confirmation,
            EditorAction::AddFormField(field) => self.data.form_fields.push(field),
            EditorAction::UpdateFormField { id, patch } => {
                if let Some(field) = self.data.form_fields.iter_mut().find(|f| f.id == id) {
                    if let Some(label) = patch.label {
                        field.label = label;
                    }
                    if let Some(field_type) = patch.field_type {
                        field.field_type = field_type;
                    }
                    if let Some(required) = patch.required {
                        field.required = required;
                    }
                    if let Some(options) = patch.options {
                        field.options = options;
                    }
                    if let Some(disabled) = patch.disabled {
                        field.disabled = disabled;
                    }
                }
            }
            EditorAction::RemoveFormField { id } => self.data.form_fields.retain(|f| f.id != id),
            EditorAction::MoveFormField { from, to } => {
                let len = self.data.form_fields.len();
                if from != to && from < len && to < len {
                    let moved = self.data.form_fields.remove(from);
                    self.data.form_fields.insert(to, moved);
                }
            }
            EditorAction::ResetForm => *self = EditorState::default(),
        }
    }

    /// Validate the draft, replacing the error map; true when valid
    pub fn validate_form(&mut self, today: NaiveDate) -> bool {
        self.errors = validate(&self.data, today)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.errors.is_empty()
    }

    /// Differences against `baseline`, or why the draft cannot be submitted
    pub fn check_submission(&mut self, baseline: &EventDraft, today: NaiveDate) -> Result<Vec<DraftDifference>> {
        if !self.validate_form(today) {
            return Err(CampusEventsError::Validation("Please fix all errors before submitting".to_string()));
        }
        let differences = diff(baseline, &self.data);
        if differences.is_empty() {
            return Err(CampusEventsError::Validation("No changes to save".to_string()));
        }
        Ok(differences)
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Field errors of a draft, keyed by draft field name
pub fn validate(draft: &EventDraft, today: NaiveDate) -> BTreeMap<&'static str, &'static str> {
    let mut errors = BTreeMap::new();

    if draft.title.trim().is_empty() {
        errors.insert("title", "Event title is required");
    }
    if draft.description.trim().is_empty() {
        errors.insert("description", "Event description is required");
    }
    if draft.location.trim().is_empty() {
        errors.insert("location", "Location is required");
    }

    match NaiveDate::parse_from_str(draft.event_date.trim(), "%Y-%m-%d") {
        Err(_) => {
            errors.insert("event_date", "Event date is required");
        }
        Ok(date) if date < today => {
            errors.insert("event_date", "Event date must be today or in the future");
        }
        Ok(_) => {}
    }

    if draft.start_time.trim().is_empty() {
        errors.insert("start_time", "Start time is required");
    }
    if draft.end_time.trim().is_empty() {
        errors.insert("end_time", "End time is required");
    } else if let (Some(start), Some(end)) = (parse_time(draft.start_time.trim()), parse_time(draft.end_time.trim())) {
        if end <= start {
            errors.insert("end_time", "End time must be after start time");
        }
    }

    if draft.total_capacity <= 0 {
        errors.insert("total_capacity", "Capacity must be greater than 0");
    }
    if draft.event_type == EventType::Paid && draft.price <= 0.0 {
        errors.insert("price", "Price must be greater than 0 for paid events");
    }

    errors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftDifference {
    pub field: &'static str,
    pub label: &'static str,
    pub original: Value,
    pub current: Value,
}

const DIFF_FIELDS: [(&str, &str); 12] = [
    ("title", "Title"),
    ("description", "Description"),
    ("location", "Location"),
    ("event_date", "Event Date"),
    ("start_time", "Start Time"),
    ("end_time", "End Time"),
    ("total_capacity", "Capacity"),
    ("registration_status", "Registration Status"),
    ("event_type", "Event Type"),
    ("price", "Price"),
    ("visibility", "Visibility"),
    ("save_mode", "Save Mode"),
];

/// Reviewed differences between two drafts
pub fn diff(original: &EventDraft, current: &EventDraft) -> Vec<DraftDifference> {
    let (Ok(Value::Object(before)), Ok(Value::Object(after))) =
        (serde_json::to_value(original), serde_json::to_value(current))
    else {
        return Vec::new();
    };

    DIFF_FIELDS
        .iter()
        .filter_map(|&(field, label)| {
            let old = before.get(field).cloned().unwrap_or(Value::Null);
            let new = after.get(field).cloned().unwrap_or(Value::Null);
            (old != new).then_some(DraftDifference {
                field,
                label,
                original: old,
                current: new,
            })
        })
        .collect()
}
