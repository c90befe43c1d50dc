//! CSV exports of the admin dashboard

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use chrono::{Local, NaiveDate};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use crate::database::{DatabaseService, LabeledResponse};
use crate::models::{
    Attendance, AttendanceListRow, PaymentFilter, PaymentListRow, Profile, RegistrationFilter, RegistrationListRow,
    RegistrationSource,
};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::helpers::{csv_line, format_date, format_timestamp};

pub const ACTION_EXPORT: &str = "EXPORT_DATA";

const REGISTRATION_HEADERS: [&str; 9] = [
    "Registration ID",
    "User Name",
    "User Email",
    "Event Title",
    "Event Date",
    "Event Price",
    "Status",
    "Entry Code",
    "Created At",
];

const ATTENDANCE_HEADERS: [&str; 8] = [
    "Attendance ID",
    "Registration ID",
    "User Name",
    "User Email",
    "Event Title",
    "Event Date",
    "Entry Code",
    "Checked In At",
];

const PAYMENT_HEADERS: [&str; 10] = [
    "Payment ID",
    "Registration ID",
    "User Name",
    "User Email",
    "Event Title",
    "Amount",
    "Status",
    "Razorpay Order ID",
    "Razorpay Payment ID",
    "Created At",
];

const USER_HEADERS: [&str; 6] = ["User ID", "Full Name", "Email", "Role", "Disabled", "Created At"];

const DETAILED_HEADERS: [&str; 7] = [
    "Registration ID",
    "User Name",
    "User Email",
    "Status",
    "Entry Code",
    "Registered At",
    "Checked In At",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Registrations,
    Attendance,
    ManualRegistrations,
    Payments,
    Users,
    EventDetailed,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Registrations => "registrations",
            ExportType::Attendance => "attendance",
            ExportType::ManualRegistrations => "manual_registrations",
            ExportType::Payments => "payments",
            ExportType::Users => "users",
            ExportType::EventDetailed => "event_detailed",
        }
    }
}

impl FromStr for ExportType {
    type Err = CampusEventsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "registrations" => Ok(ExportType::Registrations),
            "attendance" => Ok(ExportType::Attendance),
            "manual_registrations" => Ok(ExportType::ManualRegistrations),
            "payments" => Ok(ExportType::Payments),
            "users" => Ok(ExportType::Users),
            "event_detailed" => Ok(ExportType::EventDetailed),
            "" => Err(CampusEventsError::Validation("Missing exportType".to_string())),
            other => Err(CampusEventsError::Validation(format!("Unknown export type: {}", other))),
        }
    }
}

/// Attachment name, e.g. `manual-registrations-2024-03-15.csv`
pub fn export_filename(export_type: ExportType, event_id: Option<Uuid>, today: NaiveDate) -> String {
    match (export_type, event_id) {
        (ExportType::EventDetailed, Some(id)) => format!("event-{}-detailed-{}.csv", id, format_date(today)),
        _ => format!("{}-{}.csv", export_type.as_str().replace('_', "-"), format_date(today)),
    }
}

/// Header plus data rows, rendered with `\n` line endings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvDocument {
    fn with_headers(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> String {
        std::iter::once(csv_line(&self.headers))
            .chain(self.rows.iter().map(csv_line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

pub fn registrations_csv(rows: &[RegistrationListRow]) -> CsvDocument {
    let mut doc = CsvDocument::with_headers(&REGISTRATION_HEADERS);
    for r in rows {
        doc.rows.push(vec![
            r.id.to_string(),
            r.user_full_name.clone().unwrap_or_default(),
            r.user_email.clone(),
            r.event_title.clone(),
            format_date(r.event_date),
            price(r.event_price),
            r.status.clone(),
            r.entry_code.clone(),
            format_timestamp(r.created_at),
        ]);
    }
    doc
}

pub fn attendance_csv(rows: &[AttendanceListRow]) -> CsvDocument {
    let mut doc = CsvDocument::with_headers(&ATTENDANCE_HEADERS);
    for a in rows {
        doc.rows.push(vec![
            a.id.to_string(),
            a.registration_id.to_string(),
            a.user_full_name.clone().unwrap_or_default(),
            a.user_email.clone(),
            a.event_title.clone(),
            format_date(a.event_date),
            a.entry_code.clone(),
            format_timestamp(a.checked_in_at),
        ]);
    }
    doc
}

pub fn payments_csv(rows: &[PaymentListRow]) -> CsvDocument {
    let mut doc = CsvDocument::with_headers(&PAYMENT_HEADERS);
    for p in rows {
        doc.rows.push(vec![
            p.id.to_string(),
            p.registration_id.map(|id| id.to_string()).unwrap_or_default(),
            p.user_full_name.clone().unwrap_or_default(),
            p.user_email.clone().unwrap_or_default(),
            p.event_title.clone().unwrap_or_default(),
            price(p.amount),
            p.status.clone(),
            p.razorpay_order_id.clone().unwrap_or_default(),
            p.razorpay_payment_id.clone().unwrap_or_default(),
            format_timestamp(p.created_at),
        ]);
    }
    doc
}

pub fn users_csv(profiles: &[Profile]) -> CsvDocument {
    let mut doc = CsvDocument::with_headers(&USER_HEADERS);
    for p in profiles {
        doc.rows.push(vec![
            p.id.to_string(),
            p.full_name.clone().unwrap_or_default(),
            p.email.clone(),
            p.role.clone(),
            p.disabled.to_string(),
            format_timestamp(p.created_at),
        ]);
    }
    doc
}

/// One row per registration of an event, one column per answered field label
///
/// Labels are sorted; several answers under the same label are joined with `"; "`.
pub fn event_detailed_csv(
    registrations: &[RegistrationListRow],
    responses: &[LabeledResponse],
    attendance: &[Attendance],
) -> CsvDocument {
    let labels: BTreeSet<&str> = responses.iter().map(|r| r.label.as_str()).collect();

    let mut answers: HashMap<Uuid, BTreeMap<&str, String>> = HashMap::new();
    for response in responses {
        let slot = answers
            .entry(response.registration_id)
            .or_default()
            .entry(response.label.as_str())
            .or_default();
        if !slot.is_empty() {
            slot.push_str("; ");
        }
        slot.push_str(&response.value);
    }

    let checked_in: HashMap<Uuid, &Attendance> = attendance.iter().map(|a| (a.registration_id, a)).collect();

    let mut headers: Vec<&str> = DETAILED_HEADERS.to_vec();
    headers.extend(labels.iter().copied());
    let mut doc = CsvDocument::with_headers(&headers);

    for r in registrations {
        let mut row = vec![
            r.id.to_string(),
            r.user_full_name.clone().unwrap_or_default(),
            r.user_email.clone(),
            r.status.clone(),
            r.entry_code.clone(),
            format_timestamp(r.created_at),
            checked_in
                .get(&r.id)
                .map(|a| format_timestamp(a.checked_in_at))
                .unwrap_or_default(),
        ];
        let own = answers.get(&r.id);
        row.extend(
            labels
                .iter()
                .map(|label| own.and_then(|a| a.get(label)).cloned().unwrap_or_default()),
        );
        doc.rows.push(row);
    }
    doc
}

/// Rendered export ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
    pub record_count: usize,
}

#[derive(Clone)]
pub struct ExportService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl ExportService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    async fn build(&self, export_type: ExportType, event_id: Option<Uuid>) -> Result<CsvDocument> {
        let doc = match export_type {
            ExportType::Registrations => registrations_csv(&self.db.registrations.list(&RegistrationFilter::default()).await?),
            ExportType::ManualRegistrations => {
                let filter = RegistrationFilter {
                    source: Some(RegistrationSource::Manual),
                    ..Default::default()
                };
                registrations_csv(&self.db.registrations.list(&filter).await?)
            }
            ExportType::Attendance => attendance_csv(&self.db.attendance.list_rows(None).await?),
            ExportType::Payments => payments_csv(&self.db.payments.list(&PaymentFilter::default()).await?),
            ExportType::Users => users_csv(&self.db.profiles.list(None, None).await?),
            ExportType::EventDetailed => {
                let event_id = event_id.ok_or_else(|| CampusEventsError::Validation("Missing eventId".to_string()))?;
                let filter = RegistrationFilter {
                    event_id: Some(event_id),
                    ..Default::default()
                };
                let (registrations, responses, attendance) = futures::try_join!(
                    self.db.registrations.list(&filter),
                    self.db.registrations.list_labeled_responses_for_event(event_id),
                    self.db.attendance.list(),
                )?;
                event_detailed_csv(&registrations, &responses, &attendance)
            }
        };
        Ok(doc)
    }

    pub async fn export(&self, admin: &Profile, export_type: ExportType, event_id: Option<Uuid>) -> Result<CsvExport> {
        let doc = self.build(export_type, event_id).await?;
        let filename = export_filename(export_type, event_id, Local::now().date_naive());

        self.audit
            .record(
                admin.id,
                ACTION_EXPORT,
                json!({
                    "export_type": export_type.as_str(),
                    "filename": filename,
                    "record_count": doc.record_count(),
                }),
            )
            .await?;

        info!(export_type = export_type.as_str(), records = doc.record_count(), "Export generated");
        Ok(CsvExport {
            filename,
            body: doc.render(),
            record_count: doc.record_count(),
        })
    }
}
