//! Admin dashboard metrics

use chrono::{Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use crate::database::DatabaseService;
use crate::models::{Event, EventStatus};
use crate::utils::errors::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub total: usize,
    pub draft: usize,
    pub approved: usize,
    pub cancelled: usize,
    pub upcoming: usize,
    pub paid: usize,
    pub free: usize,
    pub total_capacity: i64,
}

pub fn count_events<'a>(events: impl IntoIterator<Item = &'a Event>, today: NaiveDate) -> EventCounts {
    let mut counts = EventCounts::default();
    for event in events {
        counts.total += 1;
        match event.status() {
            EventStatus::Draft => counts.draft += 1,
            EventStatus::Approved => counts.approved += 1,
            EventStatus::Cancelled => counts.cancelled += 1,
        }
        if event.event_date >= today {
            counts.upcoming += 1;
        }
        if event.is_paid {
            counts.paid += 1;
        } else {
            counts.free += 1;
        }
        counts.total_capacity += i64::from(event.capacity);
    }
    counts
}

/// Registrations as a share of all capacity, capped at 100
pub fn capacity_utilization(registrations: i64, total_capacity: i64) -> u32 {
    if total_capacity <= 0 {
        return 0;
    }
    let percent = (registrations as f64 / total_capacity as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewMetrics {
    pub users: i64,
    pub events: EventCounts,
    pub registrations: i64,
    pub attendance_today: i64,
    pub capacity_utilization: u32,
    pub payments_enabled: bool,
    pub suspicious_payments: usize,
}

#[derive(Clone)]
pub struct OverviewService {
    db: DatabaseService,
    payments_enabled: bool,
}

impl OverviewService {
    pub fn new(db: DatabaseService, payments_enabled: bool) -> Self {
        Self { db, payments_enabled }
    }

    pub async fn metrics(&self) -> Result<OverviewMetrics> {
        let now = Local::now();
        let today = now.date_naive();
        let midnight = today
            .and_hms_opt(0, 0, 0)
            .and_then(|t| Local.from_local_datetime(&t).earliest())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| now.with_timezone(&Utc));

        let (users, events, registrations, attendance_today, suspicious) = futures::try_join!(
            self.db.profiles.count(),
            self.db.events.list_with_usage(),
            self.db.registrations.count(),
            self.db.attendance.count_since(midnight),
            self.db.payments.list_suspicious(),
        )?;

        let counts = count_events(events.iter().map(|e| &e.event), today);

        Ok(OverviewMetrics {
            users,
            capacity_utilization: capacity_utilization(registrations, counts.total_capacity),
            events: counts,
            registrations,
            attendance_today,
            payments_enabled: self.payments_enabled,
            suspicious_payments: suspicious.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn event(status: EventStatus, date: NaiveDate, capacity: i32, is_paid: bool) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Event".to_string(),
            description: None,
            location: None,
            event_date: date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            capacity,
            is_registration_open: false,
            auto_close_when_full: false,
            is_paid,
            price: if is_paid { 100.0 } else { 0.0 },
            currency: "INR".to_string(),
            status: status.as_str().to_string(),
            visibility: "public".to_string(),
            assigned_organizer: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_count_events() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let events = vec![
            event(EventStatus::Draft, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(), 50, false),
            event(EventStatus::Approved, today, 100, true),
            event(EventStatus::Cancelled, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 30, false),
        ];

        let counts = count_events(&events, today);
        assert_eq!(counts.total, 3);
        assert_eq!((counts.draft, counts.approved, counts.cancelled), (1, 1, 1));
        assert_eq!(counts.upcoming, 2);
        assert_eq!((counts.paid, counts.free), (1, 2));
        assert_eq!(counts.total_capacity, 180);
    }

    #[test]
    fn test_capacity_utilization() {
        assert_eq!(capacity_utilization(45, 180), 25);
        assert_eq!(capacity_utilization(500, 180), 100);
        assert_eq!(capacity_utilization(3, 0), 0);
    }
}
