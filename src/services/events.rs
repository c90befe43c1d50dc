//! Event browsing and the admin create / update / clone operations

use std::collections::{HashMap, HashSet};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{
    CreateAdminLogRequest, CreateEventRequest, CreateFormFieldRequest, Event, EventStatus, EventWithUsage,
    FieldReconciliation, FieldType, FormField, FormFieldInput, Profile, UpdateEventRequest, UpdateFormFieldRequest,
    Visibility,
};
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::logging::log_admin_action;

pub const ACTION_CREATE: &str = "CREATE_EVENT";
pub const ACTION_UPDATE: &str = "UPDATE_EVENT";
pub const ACTION_CLONE: &str = "EVENT_CLONE";

pub const PAST_EVENT_MESSAGE: &str =
    "Past events can only be edited for description and location. Date, time, and capacity cannot be changed.";

/// Event fields as sent by the admin editor; everything is optional and loosely typed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub capacity: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub registration_status: Option<String>,
    #[serde(default)]
    pub is_registration_open: Option<bool>,
    #[serde(default)]
    pub auto_close_when_full: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub save_mode: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    /// Absent keeps the current organizer, `null` clears it
    #[serde(default)]
    pub assigned_organizer: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventBody {
    #[serde(default)]
    pub event: Option<EventInput>,
    #[serde(default)]
    pub form_fields: Vec<FormFieldInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventBody {
    #[serde(default, alias = "eventId")]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub event: Option<EventInput>,
    #[serde(default)]
    pub form_fields: Vec<FormFieldInput>,
    #[serde(default)]
    pub allow_capacity_override: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloneEventBody {
    #[serde(default, alias = "eventId")]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
}

/// Parse an admin JSON body
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|_| CampusEventsError::Validation("Invalid JSON body".to_string()))
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CampusEventsError::Validation("Invalid event date".to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| CampusEventsError::Validation("Invalid time".to_string()))
}

pub fn validate_schedule(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if end <= start {
        return Err(CampusEventsError::Validation("End time must be after start time".to_string()));
    }
    Ok(())
}

/// Capacity from the input, falling back to `current` when the key is absent
pub fn normalize_capacity(input: &EventInput, current: Option<i32>) -> Result<i32> {
    let invalid = || CampusEventsError::Validation("Capacity must be greater than 0".to_string());

    let capacity = match &input.capacity {
        None | Some(Value::Null) => current.map(f64::from).ok_or_else(invalid)?,
        Some(value) => number(Some(value)).ok_or_else(invalid)?,
    };

    if !capacity.is_finite() || capacity <= 0.0 || capacity > i32::MAX as f64 {
        return Err(invalid());
    }
    if capacity.fract() != 0.0 {
        return Err(CampusEventsError::Validation("Capacity must be a whole number".to_string()));
    }

    Ok(capacity as i32)
}

/// `(is_paid, price)`; free events always carry price 0
pub fn normalize_pricing(input: &EventInput, currently_paid: bool) -> Result<(bool, f64)> {
    let is_paid = match input.event_type.as_deref() {
        Some(kind) => kind == "paid",
        None => input.is_paid.unwrap_or(currently_paid),
    };

    if !is_paid {
        return Ok((false, 0.0));
    }

    match number(input.price.as_ref()) {
        Some(price) if price.is_finite() && price > 0.0 => Ok((true, price)),
        _ => Err(CampusEventsError::Validation("Price must be greater than 0 for paid events".to_string())),
    }
}

/// Explicit cancellation wins, then the save mode, then the current status
pub fn resolve_status(input: &EventInput, current: EventStatus) -> EventStatus {
    if input.status.as_deref() == Some("cancelled") {
        return EventStatus::Cancelled;
    }
    match input.save_mode.as_deref() {
        Some("draft") => EventStatus::Draft,
        Some("publish") => EventStatus::Approved,
        _ => input
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(current),
    }
}

pub fn resolve_registration_open(input: &EventInput, default_open: bool) -> bool {
    match input.registration_status.as_deref() {
        Some(status) => status != "closed",
        None => input.is_registration_open.unwrap_or(default_open),
    }
}

pub fn resolve_visibility(input: &EventInput) -> Visibility {
    if input.visibility.as_deref() == Some("hidden") {
        Visibility::Hidden
    } else {
        Visibility::Public
    }
}

fn resolve_organizer(input: &EventInput, current: Option<Uuid>) -> Result<Option<Uuid>> {
    match &input.assigned_organizer {
        None => Ok(current),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| CampusEventsError::Validation("Invalid assigned organizer".to_string())),
        Some(_) => Err(CampusEventsError::Validation("Invalid assigned organizer".to_string())),
    }
}

/// Lowering capacity below the confirmed count needs an explicit override
pub fn check_capacity_guard(capacity: i32, confirmed: i64, allow_override: bool) -> Result<()> {
    if confirmed > capacity as i64 && !allow_override {
        return Err(CampusEventsError::CapacityBelowConfirmed { capacity, confirmed });
    }
    Ok(())
}

/// Past events keep their schedule and capacity
pub fn check_past_event(existing: &Event, update: &UpdateEventRequest, today: NaiveDate) -> Result<()> {
    if !existing.is_past(today) {
        return Ok(());
    }

    let schedule_changed = update.event_date != existing.event_date
        || update.start_time != existing.start_time
        || update.end_time != existing.end_time;
    let capacity_changed = update.capacity != existing.capacity;

    if schedule_changed || capacity_changed {
        return Err(CampusEventsError::Validation(PAST_EVENT_MESSAGE.to_string()));
    }
    Ok(())
}

pub fn validate_form_fields(fields: &[FormFieldInput]) -> Result<()> {
    for field in fields {
        if field.label.trim().is_empty() {
            return Err(CampusEventsError::Validation("Form field label is required".to_string()));
        }
        if field.field_type == FieldType::Select && field.options.iter().all(|o| o.trim().is_empty()) {
            return Err(CampusEventsError::Validation(format!(
                "Select field \"{}\" needs at least one option",
                field.label.trim()
            )));
        }
    }
    Ok(())
}

fn clean_options(field: &FormFieldInput) -> Vec<String> {
    if field.field_type != FieldType::Select {
        return Vec::new();
    }
    field
        .options
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn event_snapshot(
    title: &str,
    description: &Option<String>,
    location: &Option<String>,
    schedule: (NaiveDate, NaiveTime, NaiveTime),
    capacity: i32,
    flags: (bool, bool, bool),
    price: f64,
    status: &str,
    visibility: &str,
    assigned_organizer: Option<Uuid>,
) -> Map<String, Value> {
    let (event_date, start_time, end_time) = schedule;
    let (is_registration_open, auto_close_when_full, is_paid) = flags;
    let value = json!({
        "title": title,
        "description": description,
        "location": location,
        "event_date": event_date,
        "start_time": start_time,
        "end_time": end_time,
        "capacity": capacity,
        "is_registration_open": is_registration_open,
        "auto_close_when_full": auto_close_when_full,
        "is_paid": is_paid,
        "price": price,
        "status": status,
        "visibility": visibility,
        "assigned_organizer": assigned_organizer,
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Event columns whose value changes, as `{column: {old, new}}`
pub fn changed_fields(existing: &Event, update: &UpdateEventRequest) -> Map<String, Value> {
    let old = event_snapshot(
        &existing.title,
        &existing.description,
        &existing.location,
        (existing.event_date, existing.start_time, existing.end_time),
        existing.capacity,
        (existing.is_registration_open, existing.auto_close_when_full, existing.is_paid),
        existing.price,
        &existing.status,
        &existing.visibility,
        existing.assigned_organizer,
    );
    let new = event_snapshot(
        &update.title,
        &update.description,
        &update.location,
        (update.event_date, update.start_time, update.end_time),
        update.capacity,
        (update.is_registration_open, update.auto_close_when_full, update.is_paid),
        update.price,
        update.status.as_str(),
        update.visibility.as_str(),
        update.assigned_organizer,
    );

    let mut changed = Map::new();
    for (key, new_value) in new {
        let old_value = old.get(&key).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            changed.insert(key, json!({"old": old_value, "new": new_value}));
        }
    }
    changed
}

/// Row changes plus the audit description of a form edit
#[derive(Debug, Clone, Default)]
pub struct FieldPlan {
    pub reconciliation: FieldReconciliation,
    pub updated: Vec<Value>,
    pub removed: Vec<Value>,
}

/// Bring the stored fields of an event in line with the edited form
///
/// Matching ids are updated in place and keep their requirement baseline;
/// stored fields missing from the form are soft-disabled; fields without a
/// known id are inserted. Nothing is deleted, so past responses stay intact.
pub fn plan_field_reconciliation(
    event_id: Uuid,
    existing: &[FormField],
    incoming: &[FormFieldInput],
    admin_id: Uuid,
    now: DateTime<Utc>,
) -> FieldPlan {
    let existing_by_id: HashMap<Uuid, &FormField> = existing.iter().map(|f| (f.id, f)).collect();
    let incoming_ids: HashSet<Uuid> = incoming
        .iter()
        .filter_map(|f| f.id)
        .filter(|id| existing_by_id.contains_key(id))
        .collect();

    let mut plan = FieldPlan::default();

    for (index, field) in incoming.iter().enumerate() {
        let position = index as i32;
        let Some(current) = field.id.and_then(|id| existing_by_id.get(&id).copied()) else {
            if !field.disabled {
                plan.reconciliation.inserts.push(CreateFormFieldRequest {
                    event_id,
                    label: field.label.trim().to_string(),
                    field_type: field.field_type,
                    required: field.required,
                    options: clean_options(field),
                    position,
                });
            }
            continue;
        };

        let original_required = current.original_required.unwrap_or(field.required);
        let overridden = original_required != field.required;
        let (overridden_by, overridden_at) = match (overridden, current.overridden_by) {
            (false, _) => (None, None),
            (true, Some(by)) if current.required == field.required => (Some(by), current.overridden_at.or(Some(now))),
            (true, _) => (Some(admin_id), Some(now)),
        };
        let (disabled_by, disabled_at) = match (field.disabled, current.disabled) {
            (false, _) => (None, None),
            (true, true) => (current.disabled_by, current.disabled_at),
            (true, false) => (Some(admin_id), Some(now)),
        };

        plan.updated.push(json!({
            "id": current.id,
            "label": {"old": current.label, "new": field.label.trim()},
            "required": {"old": current.required, "new": field.required},
            "disabled": {"old": current.disabled, "new": field.disabled},
            "original_required": {"old": current.original_required, "new": original_required},
        }));

        plan.reconciliation.updates.push(UpdateFormFieldRequest {
            id: current.id,
            label: field.label.trim().to_string(),
            field_type: field.field_type,
            required: field.required,
            options: clean_options(field),
            position,
            disabled: field.disabled,
            disabled_by,
            disabled_at,
            original_required: Some(original_required),
            overridden_by,
            overridden_at,
        });
    }

    for current in existing {
        if incoming_ids.contains(&current.id) || current.disabled {
            continue;
        }

        plan.removed.push(json!({"id": current.id, "label": current.label}));
        plan.reconciliation.updates.push(UpdateFormFieldRequest {
            id: current.id,
            label: current.label.clone(),
            field_type: current.kind(),
            required: current.required,
            options: current.options().to_vec(),
            position: current.position,
            disabled: true,
            disabled_by: Some(admin_id),
            disabled_at: Some(now),
            original_required: current.original_required,
            overridden_by: current.overridden_by,
            overridden_at: current.overridden_at,
        });
    }

    plan
}

/// Public event with seat usage and its active form
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: EventWithUsage,
    pub remaining: i64,
    pub registration_open: bool,
    pub form_fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: EventWithUsage,
    pub remaining: i64,
    pub registration_open: bool,
}

impl From<EventWithUsage> for EventSummary {
    fn from(event: EventWithUsage) -> Self {
        Self {
            remaining: event.remaining(),
            registration_open: event.registration_open(),
            event,
        }
    }
}

/// Read side used by the public pages
#[derive(Clone)]
pub struct EventCatalog {
    db: DatabaseService,
}

impl EventCatalog {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn list_public(&self) -> Result<Vec<EventSummary>> {
        let events = self.db.events.list_public_with_usage().await?;
        Ok(events.into_iter().map(EventSummary::from).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<EventSummary>> {
        let events = self.db.events.list_with_usage().await?;
        Ok(events.into_iter().map(EventSummary::from).collect())
    }

    pub async fn detail(&self, event_id: Uuid) -> Result<EventDetail> {
        let event = self
            .db
            .events
            .find_with_usage(event_id)
            .await?
            .filter(|e| e.event.status() == EventStatus::Approved)
            .ok_or_else(|| CampusEventsError::NotFound("Event not found".to_string()))?;

        let form_fields = self.db.form_fields.list_active_for_event(event_id).await?;

        Ok(EventDetail {
            remaining: event.remaining(),
            registration_open: event.registration_open(),
            event,
            form_fields,
        })
    }
}

#[derive(Clone)]
pub struct EventAdminService {
    db: DatabaseService,
    currency: String,
}

impl EventAdminService {
    pub fn new(db: DatabaseService, currency: String) -> Self {
        Self { db, currency }
    }

    pub async fn create(&self, admin: &Profile, body: CreateEventBody) -> Result<Event> {
        let input = body
            .event
            .ok_or_else(|| CampusEventsError::Validation("Missing event payload".to_string()))?;

        let (Some(title), Some(date), Some(start), Some(end)) = (
            text(&input.title),
            text(&input.event_date),
            text(&input.start_time),
            text(&input.end_time),
        ) else {
            return Err(CampusEventsError::Validation("Missing required event fields".to_string()));
        };

        let event_date = parse_date(date)?;
        let (start_time, end_time) = (parse_time(start)?, parse_time(end)?);
        validate_schedule(start_time, end_time)?;

        let capacity = normalize_capacity(&input, None)?;
        let (is_paid, price) = normalize_pricing(&input, false)?;
        validate_form_fields(&body.form_fields)?;

        let status = resolve_status(&input, EventStatus::Approved);
        let request = CreateEventRequest {
            title: title.to_string(),
            description: text(&input.description).map(str::to_string),
            location: text(&input.location).map(str::to_string),
            event_date,
            start_time,
            end_time,
            capacity,
            is_registration_open: status != EventStatus::Cancelled && resolve_registration_open(&input, false),
            auto_close_when_full: input.auto_close_when_full.unwrap_or(false),
            is_paid,
            price,
            currency: self.currency.clone(),
            status,
            visibility: resolve_visibility(&input),
            assigned_organizer: resolve_organizer(&input, None)?,
            created_by: admin.id,
        };

        let fields: Vec<FormFieldInput> = body
            .form_fields
            .into_iter()
            .filter(|f| !f.disabled)
            .map(|f| FormFieldInput {
                label: f.label.trim().to_string(),
                options: clean_options(&f),
                ..f
            })
            .collect();

        let (event, created) = self
            .db
            .create_event_with_fields(request, fields, ACTION_CREATE, |event, fields| {
                json!({
                    "event_id": event.id,
                    "title": event.title,
                    "form_field_count": fields.len(),
                })
            })
            .await?;

        log_admin_action(admin.id, ACTION_CREATE, Some(&event.id.to_string()));
        info!(event_id = %event.id, fields = created.len(), "Event created");
        Ok(event)
    }

    pub async fn update(&self, admin: &Profile, body: UpdateEventBody) -> Result<Event> {
        let event_id = body
            .event_id
            .ok_or_else(|| CampusEventsError::Validation("Missing event_id".to_string()))?;
        let input = body
            .event
            .ok_or_else(|| CampusEventsError::Validation("Missing event payload".to_string()))?;

        let (tx, loaded) = self.db.begin_event_update(event_id).await?;
        let Some((existing, fields, confirmed)) = loaded else {
            return Err(CampusEventsError::NotFound("Event not found".to_string()));
        };

        let capacity = normalize_capacity(&input, Some(existing.capacity))?;
        check_capacity_guard(capacity, confirmed, body.allow_capacity_override)?;

        let (Some(date), Some(start), Some(end)) = (
            text(&input.event_date),
            text(&input.start_time),
            text(&input.end_time),
        ) else {
            return Err(CampusEventsError::Validation("Missing required date/time fields".to_string()));
        };
        let event_date = parse_date(date)?;
        let (start_time, end_time) = (parse_time(start)?, parse_time(end)?);
        validate_schedule(start_time, end_time)?;

        let (is_paid, price) = normalize_pricing(&input, existing.is_paid)?;
        validate_form_fields(&body.form_fields)?;

        let status = resolve_status(&input, existing.status());
        let update = UpdateEventRequest {
            title: text(&input.title).unwrap_or(&existing.title).to_string(),
            description: input.description.clone().or_else(|| existing.description.clone()),
            location: input.location.clone().or_else(|| existing.location.clone()),
            event_date,
            start_time,
            end_time,
            capacity,
            is_registration_open: status != EventStatus::Cancelled && resolve_registration_open(&input, true),
            auto_close_when_full: input.auto_close_when_full.unwrap_or(existing.auto_close_when_full),
            is_paid,
            price,
            status,
            visibility: resolve_visibility(&input),
            assigned_organizer: resolve_organizer(&input, existing.assigned_organizer)?,
        };

        check_past_event(&existing, &update, Local::now().date_naive())?;

        let now = Utc::now();
        let plan = plan_field_reconciliation(event_id, &fields, &body.form_fields, admin.id, now);

        let mut changed = changed_fields(&existing, &update);
        if !plan.removed.is_empty() {
            changed.insert("form_fields_removed".to_string(), json!({"old": plan.removed, "new": []}));
        }
        if !plan.updated.is_empty() {
            changed.insert("form_fields_updated".to_string(), json!({"old": plan.updated, "new": []}));
        }
        let added = plan.reconciliation.inserts.len();

        let log = CreateAdminLogRequest::new(
            admin.id,
            ACTION_UPDATE,
            json!({
                "event_id": event_id,
                "changed_fields": changed,
                "form_fields_added": added,
                "timestamp": now,
            }),
        );

        let event = self
            .db
            .finish_event_update(tx, event_id, update, plan.reconciliation, log)
            .await?;

        log_admin_action(admin.id, ACTION_UPDATE, Some(&event_id.to_string()));
        Ok(event)
    }

    pub async fn clone_event(&self, admin: &Profile, body: CloneEventBody) -> Result<Event> {
        let source_id = body
            .event_id
            .ok_or_else(|| CampusEventsError::Validation("Missing eventId".to_string()))?;

        let source = self
            .db
            .events
            .find_by_id(source_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("Event not found".to_string()))?;
        let fields = self.db.form_fields.list_for_event(source_id).await?;

        let title = text(&body.title)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} (Copy)", source.title));

        let request = CreateEventRequest {
            title: title.clone(),
            description: source.description.clone(),
            location: source.location.clone(),
            event_date: body.event_date.unwrap_or_else(|| Local::now().date_naive()),
            start_time: source.start_time,
            end_time: source.end_time,
            capacity: source.capacity,
            is_registration_open: false,
            auto_close_when_full: source.auto_close_when_full,
            is_paid: source.is_paid,
            price: source.price,
            currency: source.currency.clone(),
            status: EventStatus::Draft,
            visibility: Visibility::Hidden,
            assigned_organizer: source.assigned_organizer,
            created_by: admin.id,
        };

        // Copies start enabled and at their baseline requirement
        let copies: Vec<FormFieldInput> = fields
            .iter()
            .map(|f| FormFieldInput {
                id: None,
                label: f.label.clone(),
                field_type: f.kind(),
                required: f.baseline_required(),
                options: f.options().to_vec(),
                disabled: false,
            })
            .collect();

        let source_title = source.title.clone();
        let (event, _) = self
            .db
            .create_event_with_fields(request, copies, ACTION_CLONE, |event, _| {
                json!({
                    "original_event_id": source_id,
                    "cloned_event_id": event.id,
                    "original_title": source_title,
                    "cloned_title": event.title,
                })
            })
            .await?;

        log_admin_action(admin.id, ACTION_CLONE, Some(&event.id.to_string()));
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn input(value: Value) -> EventInput {
        serde_json::from_value(value).unwrap()
    }

    fn event(date: NaiveDate) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Hackathon".to_string(),
            description: Some("24h build".to_string()),
            location: Some("Main Hall".to_string()),
            event_date: date,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            capacity: 100,
            is_registration_open: true,
            auto_close_when_full: false,
            is_paid: false,
            price: 0.0,
            currency: "INR".to_string(),
            status: "approved".to_string(),
            visibility: "public".to_string(),
            assigned_organizer: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unchanged(event: &Event) -> UpdateEventRequest {
        UpdateEventRequest {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            capacity: event.capacity,
            is_registration_open: event.is_registration_open,
            auto_close_when_full: event.auto_close_when_full,
            is_paid: event.is_paid,
            price: event.price,
            status: event.status(),
            visibility: Visibility::Public,
            assigned_organizer: event.assigned_organizer,
        }
    }

    fn stored_field(event_id: Uuid, label: &str, required: bool, position: i32) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            event_id,
            label: label.to_string(),
            field_type: "text".to_string(),
            required,
            options: None::<Json<Vec<String>>>,
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

    #[test]
    fn test_capacity_must_be_positive() {
        assert_eq!(normalize_capacity(&input(json!({"capacity": 50})), None).unwrap(), 50);
        assert_eq!(normalize_capacity(&input(json!({"capacity": "25"})), None).unwrap(), 25);
        assert_eq!(normalize_capacity(&input(json!({})), Some(80)).unwrap(), 80);

        for bad in [json!({"capacity": 0}), json!({"capacity": -3}), json!({"capacity": "abc"}), json!({})] {
            let err = normalize_capacity(&input(bad), None).unwrap_err();
            assert_eq!(err.to_string(), "Capacity must be greater than 0");
        }
    }

    #[test]
    fn test_capacity_guard() {
        let err = check_capacity_guard(5, 8, false).unwrap_err();
        assert_eq!(err.code(), Some("CAPACITY_BELOW_CONFIRMED"));
        assert!(matches!(err, CampusEventsError::CapacityBelowConfirmed { confirmed: 8, .. }));

        assert!(check_capacity_guard(5, 8, true).is_ok());
        assert!(check_capacity_guard(8, 8, false).is_ok());
    }

    #[test]
    fn test_schedule_validation() {
        let ten = parse_time("10:00").unwrap();
        assert_eq!(ten, parse_time("10:00:00").unwrap());
        assert!(validate_schedule(ten, parse_time("09:30").unwrap()).is_err());
        assert!(validate_schedule(ten, ten).is_err());
        assert!(validate_schedule(ten, parse_time("11:00").unwrap()).is_ok());
    }

    #[test]
    fn test_pricing_normalization() {
        assert_eq!(
            normalize_pricing(&input(json!({"event_type": "free", "price": 300})), true).unwrap(),
            (false, 0.0)
        );
        assert_eq!(
            normalize_pricing(&input(json!({"event_type": "paid", "price": "199.5"})), false).unwrap(),
            (true, 199.5)
        );

        let err = normalize_pricing(&input(json!({"event_type": "paid", "price": 0})), false).unwrap_err();
        assert_eq!(err.to_string(), "Price must be greater than 0 for paid events");
    }

    #[test]
    fn test_status_resolution() {
        assert_eq!(resolve_status(&input(json!({"status": "cancelled", "save_mode": "publish"})), EventStatus::Approved), EventStatus::Cancelled);
        assert_eq!(resolve_status(&input(json!({"save_mode": "draft"})), EventStatus::Approved), EventStatus::Draft);
        assert_eq!(resolve_status(&input(json!({"save_mode": "publish"})), EventStatus::Draft), EventStatus::Approved);
        assert_eq!(resolve_status(&input(json!({})), EventStatus::Draft), EventStatus::Draft);
    }

    #[test]
    fn test_past_event_schedule_is_frozen() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let past = event(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let mut description_only = unchanged(&past);
        description_only.description = Some("Recap and photos".to_string());
        assert!(check_past_event(&past, &description_only, today).is_ok());

        let mut moved = unchanged(&past);
        moved.capacity = 120;
        assert_eq!(check_past_event(&past, &moved, today).unwrap_err().to_string(), PAST_EVENT_MESSAGE);

        let upcoming = event(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        let mut rescheduled = unchanged(&upcoming);
        rescheduled.event_date = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        assert!(check_past_event(&upcoming, &rescheduled, today).is_ok());
    }

    #[test]
    fn test_changed_fields_only_lists_differences() {
        let existing = event(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert!(changed_fields(&existing, &unchanged(&existing)).is_empty());

        let mut update = unchanged(&existing);
        update.is_paid = true;
        update.price = 250.0;
        let changed = changed_fields(&existing, &update);

        assert_eq!(changed.len(), 2);
        assert_eq!(changed["price"], json!({"old": 0.0, "new": 250.0}));
    }

    #[test]
    fn test_field_reconciliation() {
        let event_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let now = Utc::now();
        let name = stored_field(event_id, "Full Name", true, 0);
        let dept = stored_field(event_id, "Department", false, 1);
        let legacy = stored_field(event_id, "Legacy", true, 2);

        let incoming = vec![
            FormFieldInput {
                id: Some(name.id),
                label: "Full Name".to_string(),
                field_type: FieldType::Text,
                required: false,
                options: vec![],
                disabled: false,
            },
            FormFieldInput {
                id: Some(dept.id),
                label: "Department".to_string(),
                field_type: FieldType::Text,
                required: false,
                options: vec![],
                disabled: true,
            },
            FormFieldInput {
                id: None,
                label: "T-shirt Size".to_string(),
                field_type: FieldType::Select,
                required: true,
                options: vec!["S".to_string(), " M ".to_string(), "".to_string()],
                disabled: false,
            },
        ];

        let plan = plan_field_reconciliation(event_id, &[name.clone(), dept.clone(), legacy.clone()], &incoming, admin_id, now);
        let updates: HashMap<Uuid, &UpdateFormFieldRequest> = plan.reconciliation.updates.iter().map(|u| (u.id, u)).collect();

        // Requirement override keeps the baseline and records who changed it
        let name_update = updates[&name.id];
        assert!(!name_update.required);
        assert_eq!(name_update.original_required, Some(true));
        assert_eq!(name_update.overridden_by, Some(admin_id));

        let dept_update = updates[&dept.id];
        assert!(dept_update.disabled);
        assert_eq!(dept_update.disabled_by, Some(admin_id));
        assert_eq!(dept_update.overridden_by, None);

        // Missing fields are soft-disabled, never deleted
        let legacy_update = updates[&legacy.id];
        assert!(legacy_update.disabled);
        assert_eq!(plan.removed.len(), 1);

        assert_eq!(plan.reconciliation.inserts.len(), 1);
        assert_eq!(plan.reconciliation.inserts[0].options, vec!["S".to_string(), "M".to_string()]);
        assert_eq!(plan.reconciliation.inserts[0].position, 2);
    }

    #[test]
    fn test_select_fields_need_options() {
        let field = FormFieldInput {
            id: None,
            label: "Size".to_string(),
            field_type: FieldType::Select,
            required: true,
            options: vec![" ".to_string()],
            disabled: false,
        };
        assert!(validate_form_fields(&[field]).is_err());
    }

    #[test]
    fn test_update_body_accepts_both_id_spellings() {
        let id = Uuid::new_v4();
        let body: UpdateEventBody = parse_json_body(json!({"eventId": id, "event": {}}).to_string().as_bytes()).unwrap();
        assert_eq!(body.event_id, Some(id));
        assert!(!body.allow_capacity_override);

        let body: CloneEventBody = parse_json_body(json!({"event_id": id}).to_string().as_bytes()).unwrap();
        assert_eq!(body.event_id, Some(id));

        let err = parse_json_body::<UpdateEventBody>(b"nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON body");
    }
}
