//! Tickets and their QR codes

use chrono::{NaiveDate, NaiveTime};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::middleware::auth::{require_role, CurrentUser};
use crate::models::{RegistrationStatus, Role, TicketRow};
use crate::utils::errors::{CampusEventsError, Result};

pub const QR_SIZE: u32 = 180;
pub const QR_DARK: &str = "#0ea5e9";
pub const QR_LIGHT: &str = "#020617";

/// Payload scanned at the door
pub fn qr_payload(registration_id: Uuid) -> String {
    json!({ "registration_id": registration_id }).to_string()
}

pub fn render_qr_svg(registration_id: Uuid) -> Result<String> {
    let code = QrCode::new(qr_payload(registration_id).as_bytes())
        .map_err(|e| CampusEventsError::Validation(format!("Unable to encode ticket: {}", e)))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .dark_color(svg::Color(QR_DARK))
        .light_color(svg::Color(QR_LIGHT))
        .build())
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub status: String,
    pub status_label: &'static str,
    pub entry_code: String,
    pub qr_svg: String,
}

impl TicketView {
    pub fn from_row(row: TicketRow) -> Result<Self> {
        let status: RegistrationStatus = row.status.parse().unwrap_or(RegistrationStatus::Cancelled);
        Ok(Self {
            qr_svg: render_qr_svg(row.id)?,
            registration_id: row.id,
            event_id: row.event_id,
            event_title: row.event_title,
            event_date: row.event_date,
            start_time: row.start_time,
            end_time: row.end_time,
            location: row.location,
            status: row.status,
            status_label: status.ticket_label(),
            entry_code: row.entry_code,
        })
    }
}

#[derive(Clone)]
pub struct TicketService {
    db: DatabaseService,
}

impl TicketService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Load a ticket the viewer may see: their own, or any ticket for staff
    pub async fn find_visible(&self, viewer: &CurrentUser, registration_id: Uuid) -> Result<TicketRow> {
        let ticket = self
            .db
            .registrations
            .find_ticket(registration_id)
            .await?
            .ok_or_else(|| CampusEventsError::NotFound("Ticket not found".to_string()))?;

        if ticket.user_id != viewer.id {
            let profile = self
                .db
                .profiles
                .find_by_id(viewer.id)
                .await?
                .ok_or_else(|| CampusEventsError::PermissionDenied("Not authorized".to_string()))?;
            require_role(&profile, &[Role::Organizer, Role::Admin])?;
        }

        Ok(ticket)
    }

    pub async fn view(&self, viewer: &CurrentUser, registration_id: Uuid) -> Result<TicketView> {
        TicketView::from_row(self.find_visible(viewer, registration_id).await?)
    }

    pub async fn qr_svg(&self, viewer: &CurrentUser, registration_id: Uuid) -> Result<String> {
        let ticket = self.find_visible(viewer, registration_id).await?;
        render_qr_svg(ticket.id)
    }
}
