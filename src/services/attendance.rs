//! Attendance statistics and the admin attendance view

use std::collections::{BTreeMap, HashMap, HashSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{Attendance, AttendanceListRow, EventAttendanceStats, RegistrationFilter, RegistrationListRow, RegistrationStatus};
use crate::utils::errors::Result;

fn stats_from_counts(event_id: Uuid, total: u32, present: u32) -> EventAttendanceStats {
    let rate = if total == 0 {
        0
    } else {
        ((present as f64 / total as f64) * 100.0).round() as u32
    };

    EventAttendanceStats {
        event_id,
        total,
        present,
        absent: total - present,
        rate,
    }
}

/// Present/absent counts of every event, in one pass over the registrations
///
/// Only CONFIRMED registrations count towards the total.
pub fn compute_event_stats(registrations: &[RegistrationListRow], attendance: &[Attendance]) -> BTreeMap<Uuid, EventAttendanceStats> {
    let checked_in: HashSet<Uuid> = attendance.iter().map(|a| a.registration_id).collect();

    let mut counts: BTreeMap<Uuid, (u32, u32)> = BTreeMap::new();
    for registration in registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Confirmed.as_str())
    {
        let (total, present) = counts.entry(registration.event_id).or_default();
        *total += 1;
        if checked_in.contains(&registration.id) {
            *present += 1;
        }
    }

    counts
        .into_iter()
        .map(|(event_id, (total, present))| (event_id, stats_from_counts(event_id, total, present)))
        .collect()
}

/// Counts of a single event
pub fn compute_stats(event_id: Uuid, registrations: &[RegistrationListRow], attendance: &[Attendance]) -> EventAttendanceStats {
    compute_event_stats(registrations, attendance)
        .remove(&event_id)
        .unwrap_or_else(|| stats_from_counts(event_id, 0, 0))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendanceSummary {
    pub event_title: String,
    #[serde(flatten)]
    pub stats: EventAttendanceStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceView {
    pub events: Vec<EventAttendanceSummary>,
    pub checked_in: Vec<AttendanceListRow>,
    pub not_checked_in: Vec<RegistrationListRow>,
}

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseService,
}

impl AttendanceService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn view(&self, event_id: Option<Uuid>) -> Result<AttendanceView> {
        let filter = RegistrationFilter {
            event_id,
            status: Some(RegistrationStatus::Confirmed),
            ..Default::default()
        };

        let (registrations, attendance, checked_in) = futures::try_join!(
            self.db.registrations.list(&filter),
            self.db.attendance.list(),
            self.db.attendance.list_rows(event_id),
        )?;

        let mut titles: HashMap<Uuid, &str> = HashMap::new();
        for registration in &registrations {
            titles.entry(registration.event_id).or_insert(registration.event_title.as_str());
        }

        let mut events: Vec<EventAttendanceSummary> = compute_event_stats(&registrations, &attendance)
            .into_values()
            .map(|stats| EventAttendanceSummary {
                event_title: titles.get(&stats.event_id).copied().unwrap_or_default().to_string(),
                stats,
            })
            .collect();
        events.sort_by(|a, b| a.event_title.cmp(&b.event_title));

        let present: HashSet<Uuid> = attendance.iter().map(|a| a.registration_id).collect();
        let not_checked_in = registrations
            .into_iter()
            .filter(|r| !present.contains(&r.id))
            .collect();

        Ok(AttendanceView {
            events,
            checked_in,
            not_checked_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn registration(event_id: Uuid, status: RegistrationStatus) -> RegistrationListRow {
        RegistrationListRow {
            id: Uuid::new_v4(),
            event_id,
            user_id: Uuid::new_v4(),
            status: status.as_str().to_string(),
            entry_code: "A1B2C3D4E5F6".to_string(),
            created_at: Utc::now(),
            event_title: "Hackathon".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            event_is_paid: false,
            event_price: 0.0,
            user_full_name: None,
            user_email: "student@example.edu".to_string(),
        }
    }

    fn attended(registration: &RegistrationListRow) -> Attendance {
        Attendance {
            id: Uuid::new_v4(),
            registration_id: registration.id,
            checked_in_at: Utc::now(),
            checked_in_by: None,
        }
    }

    #[test]
    fn test_compute_stats() {
        let event_id = Uuid::new_v4();
        let registrations = vec![
            registration(event_id, RegistrationStatus::Confirmed),
            registration(event_id, RegistrationStatus::Confirmed),
            registration(event_id, RegistrationStatus::Confirmed),
            registration(event_id, RegistrationStatus::Pending),
            registration(Uuid::new_v4(), RegistrationStatus::Confirmed),
        ];
        let attendance = vec![attended(&registrations[0]), attended(&registrations[4])];

        let stats = compute_stats(event_id, &registrations, &attendance);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.absent, 2);
        assert_eq!(stats.rate, 33);
    }

    #[test]
    fn test_compute_stats_without_registrations() {
        let stats = compute_stats(Uuid::new_v4(), &[], &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.rate, 0);
    }

    #[test]
    fn test_event_stats_cover_every_event() {
        let hackathon = Uuid::new_v4();
        let workshop = Uuid::new_v4();
        let registrations = vec![
            registration(hackathon, RegistrationStatus::Confirmed),
            registration(workshop, RegistrationStatus::Confirmed),
            registration(hackathon, RegistrationStatus::Confirmed),
            registration(workshop, RegistrationStatus::Cancelled),
            registration(hackathon, RegistrationStatus::Pending),
        ];
        let attendance = vec![attended(&registrations[0]), attended(&registrations[1])];

        let stats = compute_event_stats(&registrations, &attendance);
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[&hackathon].total, stats[&hackathon].present, stats[&hackathon].rate), (2, 1, 50));
        assert_eq!((stats[&workshop].total, stats[&workshop].present, stats[&workshop].rate), (1, 1, 100));
        assert_eq!(stats[&hackathon], compute_stats(hackathon, &registrations, &attendance));
    }

    #[test]
    fn test_two_of_three_rounds_up() {
        let event_id = Uuid::new_v4();
        let registrations = vec![
            registration(event_id, RegistrationStatus::Confirmed),
            registration(event_id, RegistrationStatus::Confirmed),
            registration(event_id, RegistrationStatus::Confirmed),
        ];
        let attendance = vec![attended(&registrations[0]), attended(&registrations[1])];

        assert_eq!(compute_stats(event_id, &registrations, &attendance).rate, 67);
    }
}
