//! Attendance repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::models::attendance::{Attendance, AttendanceListRow};
use crate::utils::errors::CampusEventsError;

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record attendance unless a row already exists for the registration
    ///
    /// Returns `None` when the registration was already checked in.
    pub async fn insert_if_absent(&self, registration_id: Uuid, checked_in_by: Option<Uuid>) -> Result<Option<Attendance>, CampusEventsError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (registration_id, checked_in_at, checked_in_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (registration_id) DO NOTHING
            RETURNING id, registration_id, checked_in_at, checked_in_by
            "#
        )
        .bind(registration_id)
        .bind(Utc::now())
        .bind(checked_in_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendance)
    }

    /// Find attendance for a registration
    pub async fn find_by_registration(&self, registration_id: Uuid) -> Result<Option<Attendance>, CampusEventsError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            "SELECT id, registration_id, checked_in_at, checked_in_by FROM attendance WHERE registration_id = $1"
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendance)
    }

    /// Remove the attendance row of a registration
    pub async fn delete_by_registration(&self, registration_id: Uuid) -> Result<Option<Attendance>, CampusEventsError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            "DELETE FROM attendance WHERE registration_id = $1 RETURNING id, registration_id, checked_in_at, checked_in_by"
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendance)
    }

    /// Every attendance row
    pub async fn list(&self) -> Result<Vec<Attendance>, CampusEventsError> {
        let rows = sqlx::query_as::<_, Attendance>(
            "SELECT id, registration_id, checked_in_at, checked_in_by FROM attendance ORDER BY checked_in_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Attendance joined with registration, event and attendee, optionally for one event
    pub async fn list_rows(&self, event_id: Option<Uuid>) -> Result<Vec<AttendanceListRow>, CampusEventsError> {
        let rows = sqlx::query_as::<_, AttendanceListRow>(
            r#"
            SELECT a.id, a.registration_id, a.checked_in_at, r.entry_code, r.event_id,
                   e.title AS event_title, e.event_date, p.full_name AS user_full_name, p.email AS user_email
            FROM attendance a
            INNER JOIN registrations r ON r.id = a.registration_id
            INNER JOIN events e ON e.id = r.event_id
            INNER JOIN profiles p ON p.id = r.user_id
            WHERE ($1::uuid IS NULL OR r.event_id = $1)
            ORDER BY a.checked_in_at DESC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Count check-ins since a point in time
    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, CampusEventsError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE checked_in_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
