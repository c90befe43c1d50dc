//! Event model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const EVENT_COLUMNS: &str = "id, title, description, location, event_date, start_time, end_time, capacity, \
    is_registration_open, auto_close_when_full, is_paid, price, currency, status, visibility, \
    assigned_organizer, created_by, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub is_registration_open: bool,
    pub auto_close_when_full: bool,
    pub is_paid: bool,
    pub price: f64,
    pub currency: String,
    pub status: String,
    pub visibility: String,
    pub assigned_organizer: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn status(&self) -> EventStatus {
        self.status.parse().unwrap_or(EventStatus::Draft)
    }

    /// The event took place before `today`
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.event_date < today
    }
}

/// Event with its seat usage (PENDING + CONFIRMED registrations)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventWithUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub used: i64,
}

impl EventWithUsage {
    pub fn remaining(&self) -> i64 {
        (self.event.capacity as i64 - self.used).max(0)
    }

    pub fn registration_open(&self) -> bool {
        self.event.is_registration_open && self.remaining() > 0
    }
}

/// Row written when an event is created or cloned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub is_registration_open: bool,
    pub auto_close_when_full: bool,
    pub is_paid: bool,
    pub price: f64,
    pub currency: String,
    pub status: EventStatus,
    pub visibility: Visibility,
    pub assigned_organizer: Option<Uuid>,
    pub created_by: Uuid,
}

/// Full replacement of the editable event columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub is_registration_open: bool,
    pub auto_close_when_full: bool,
    pub is_paid: bool,
    pub price: f64,
    pub status: EventStatus,
    pub visibility: Visibility,
    pub assigned_organizer: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Approved,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Approved => "approved",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "approved" => Ok(EventStatus::Approved),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!("Unknown event status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Hidden,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Hidden => "hidden",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "hidden" => Ok(Visibility::Hidden),
            other => Err(format!("Unknown visibility: {}", other)),
        }
    }
}
