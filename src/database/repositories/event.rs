//! Event repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use uuid::Uuid;
use crate::models::event::{Event, EventWithUsage, CreateEventRequest, UpdateEventRequest, EVENT_COLUMNS};
use crate::utils::errors::CampusEventsError;

/// Seats held by registrations that are still pending payment or confirmed
const USED_SEATS: &str = "(SELECT COUNT(*) FROM registrations r WHERE r.event_id = events.id AND r.status IN ('PENDING', 'CONFIRMED')) AS used";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, CampusEventsError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, request).await
    }

    /// Insert an event on an existing connection or transaction
    pub async fn insert(conn: &mut PgConnection, request: CreateEventRequest) -> Result<Event, CampusEventsError> {
        let now = Utc::now();
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, location, event_date, start_time, end_time, capacity,
                                is_registration_open, auto_close_when_full, is_paid, price, currency, status,
                                visibility, assigned_organizer, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(request.title)
        .bind(request.description)
        .bind(request.location)
        .bind(request.event_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.capacity)
        .bind(request.is_registration_open)
        .bind(request.auto_close_when_full)
        .bind(request.is_paid)
        .bind(request.price)
        .bind(request.currency)
        .bind(request.status.as_str())
        .bind(request.visibility.as_str())
        .bind(request.assigned_organizer)
        .bind(request.created_by)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, CampusEventsError> {
        let mut conn = self.pool.acquire().await?;
        Self::find_for_update(&mut conn, id, false).await
    }

    /// Load an event, optionally locking the row for the rest of the transaction
    pub async fn find_for_update(conn: &mut PgConnection, id: Uuid, lock: bool) -> Result<Option<Event>, CampusEventsError> {
        let sql = format!(
            "SELECT {} FROM events WHERE id = $1{}",
            EVENT_COLUMNS,
            if lock { " FOR UPDATE" } else { "" }
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(event)
    }

    /// Find event by ID together with its used seats
    pub async fn find_with_usage(&self, id: Uuid) -> Result<Option<EventWithUsage>, CampusEventsError> {
        let event = sqlx::query_as::<_, EventWithUsage>(&format!(
            "SELECT {}, {} FROM events WHERE id = $1",
            EVENT_COLUMNS, USED_SEATS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Approved, public events ordered by date
    pub async fn list_public_with_usage(&self) -> Result<Vec<EventWithUsage>, CampusEventsError> {
        let events = sqlx::query_as::<_, EventWithUsage>(&format!(
            "SELECT {}, {} FROM events WHERE status = 'approved' AND visibility = 'public' ORDER BY event_date ASC, start_time ASC",
            EVENT_COLUMNS, USED_SEATS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Every event, newest date first
    pub async fn list_with_usage(&self) -> Result<Vec<EventWithUsage>, CampusEventsError> {
        let events = sqlx::query_as::<_, EventWithUsage>(&format!(
            "SELECT {}, {} FROM events ORDER BY event_date DESC, start_time DESC",
            EVENT_COLUMNS, USED_SEATS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Replace the editable columns of an event
    pub async fn update(conn: &mut PgConnection, id: Uuid, request: UpdateEventRequest) -> Result<Event, CampusEventsError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                location = $4,
                event_date = $5,
                start_time = $6,
                end_time = $7,
                capacity = $8,
                is_registration_open = $9,
                auto_close_when_full = $10,
                is_paid = $11,
                price = $12,
                status = $13,
                visibility = $14,
                assigned_organizer = $15,
                updated_at = $16
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.location)
        .bind(request.event_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.capacity)
        .bind(request.is_registration_open)
        .bind(request.auto_close_when_full)
        .bind(request.is_paid)
        .bind(request.price)
        .bind(request.status.as_str())
        .bind(request.visibility.as_str())
        .bind(request.assigned_organizer)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(event)
    }

    /// Count CONFIRMED registrations of an event
    pub async fn count_confirmed(conn: &mut PgConnection, id: Uuid) -> Result<i64, CampusEventsError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'CONFIRMED'"
        )
        .bind(id)
        .fetch_one(conn)
        .await?;

        Ok(count.0)
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, CampusEventsError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
