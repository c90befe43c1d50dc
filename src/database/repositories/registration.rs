//! Registration repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};
use chrono::Utc;
use uuid::Uuid;
use crate::models::registration::{
    Registration, RegistrationResponse, RegistrationListRow, RegistrationFilter, TicketRow, Answer,
    CreateManualRegistrationRequest, RegistrationStatus, PaymentType, RegistrationSource,
};
use crate::utils::errors::CampusEventsError;

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, entry_code, created_at, updated_at";

/// SQLSTATE raised by `register_for_event` when the event has no seats left
const SQLSTATE_EVENT_FULL: &str = "EV001";
/// SQLSTATE raised by the registration procedures for every other rejection
const SQLSTATE_REJECTED: &str = "EV002";

const LIST_SELECT: &str = r#"
    SELECT r.id, r.event_id, r.user_id, r.status, r.entry_code, r.created_at,
           e.title AS event_title, e.event_date, e.is_paid AS event_is_paid, e.price AS event_price,
           p.full_name AS user_full_name, p.email AS user_email
    FROM registrations r
    INNER JOIN events e ON e.id = r.event_id
    INNER JOIN profiles p ON p.id = r.user_id
    WHERE 1 = 1
"#;

/// One answer with the label of its field, used by detailed exports
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabeledResponse {
    pub registration_id: Uuid,
    pub label: String,
    pub value: String,
}

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the capacity-checked registration procedure
    pub async fn register_for_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Uuid, CampusEventsError> {
        let row: (Uuid,) = sqlx::query_as("SELECT register_for_event($1, $2)")
            .bind(event_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_procedure_error)?;

        Ok(row.0)
    }

    /// Move a PENDING registration to CONFIRMED through the backend procedure
    pub async fn confirm(&self, registration_id: Uuid) -> Result<(), CampusEventsError> {
        sqlx::query("SELECT confirm_registration($1)")
            .bind(registration_id)
            .execute(&self.pool)
            .await
            .map_err(map_procedure_error)?;

        Ok(())
    }

    /// Persist all answers of one registration in a single statement
    pub async fn insert_responses(&self, registration_id: Uuid, answers: &[Answer]) -> Result<u64, CampusEventsError> {
        if answers.is_empty() {
            return Ok(0);
        }

        let field_ids: Vec<Uuid> = answers.iter().map(|a| a.field_id).collect();
        let values: Vec<String> = answers.iter().map(|a| a.value.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO registration_responses (registration_id, field_id, value)
            SELECT $1, field_id, value FROM UNNEST($2::uuid[], $3::text[]) AS answers(field_id, value)
            "#
        )
        .bind(registration_id)
        .bind(field_ids)
        .bind(values)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, CampusEventsError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find registration by entry code
    pub async fn find_by_entry_code(&self, entry_code: &str) -> Result<Option<Registration>, CampusEventsError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE entry_code = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(entry_code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Latest registration of a user for an event, any status
    pub async fn find_for_user_and_event(&self, user_id: Uuid, event_id: Uuid) -> Result<Option<Registration>, CampusEventsError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE user_id = $1 AND event_id = $2 ORDER BY created_at DESC LIMIT 1",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Insert an already confirmed registration created by an admin
    pub async fn create_manual(&self, request: CreateManualRegistrationRequest) -> Result<Registration, CampusEventsError> {
        let now = Utc::now();
        let registration = sqlx::query_as::<_, Registration>(&format!(
            r#"
            INSERT INTO registrations (event_id, user_id, status, entry_code, created_at, updated_at)
            VALUES ($1, $2, 'CONFIRMED', $3, $4, $4)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(request.entry_code)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Set the status of a registration
    pub async fn update_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration, CampusEventsError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "UPDATE registrations SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Registrations joined with event and attendee, newest first
    pub async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<RegistrationListRow>, CampusEventsError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(LIST_SELECT);

        if let Some(event_id) = filter.event_id {
            query.push(" AND r.event_id = ").push_bind(event_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND r.status = ").push_bind(status.as_str());
        }
        match filter.payment_type {
            Some(PaymentType::Paid) => {
                query.push(" AND e.is_paid = TRUE");
            }
            Some(PaymentType::Free) => {
                query.push(" AND e.is_paid = FALSE");
            }
            None => {}
        }
        match filter.source {
            Some(RegistrationSource::Manual) => {
                query.push(" AND r.entry_code LIKE 'MANUAL-%'");
            }
            Some(RegistrationSource::Auto) => {
                query.push(" AND r.entry_code NOT LIKE 'MANUAL-%'");
            }
            None => {}
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            query
                .push(" AND (r.entry_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY r.created_at DESC");

        let rows = query
            .build_query_as::<RegistrationListRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Registration with the event details shown on its ticket
    pub async fn find_ticket(&self, id: Uuid) -> Result<Option<TicketRow>, CampusEventsError> {
        let ticket = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.entry_code, r.created_at,
                   e.title AS event_title, e.event_date, e.start_time, e.end_time, e.location
            FROM registrations r
            INNER JOIN events e ON e.id = r.event_id
            WHERE r.id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Responses of one registration
    pub async fn list_responses(&self, registration_id: Uuid) -> Result<Vec<RegistrationResponse>, CampusEventsError> {
        let responses = sqlx::query_as::<_, RegistrationResponse>(
            "SELECT id, registration_id, field_id, value, created_at FROM registration_responses WHERE registration_id = $1 ORDER BY created_at ASC"
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(responses)
    }

    /// Responses given to one field, kept even after the field is disabled
    pub async fn list_responses_for_field(&self, field_id: Uuid) -> Result<Vec<RegistrationResponse>, CampusEventsError> {
        let responses = sqlx::query_as::<_, RegistrationResponse>(
            "SELECT id, registration_id, field_id, value, created_at FROM registration_responses WHERE field_id = $1 ORDER BY created_at ASC"
        )
        .bind(field_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(responses)
    }

    /// All answers for an event with field labels
    pub async fn list_labeled_responses_for_event(&self, event_id: Uuid) -> Result<Vec<LabeledResponse>, CampusEventsError> {
        let responses = sqlx::query_as::<_, LabeledResponse>(
            r#"
            SELECT rr.registration_id, f.label, rr.value
            FROM registration_responses rr
            INNER JOIN event_form_fields f ON f.id = rr.field_id
            INNER JOIN registrations r ON r.id = rr.registration_id
            WHERE r.event_id = $1
            ORDER BY rr.created_at ASC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(responses)
    }

    /// Count total registrations
    pub async fn count(&self) -> Result<i64, CampusEventsError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

/// Translate procedure exceptions into registration errors
fn map_procedure_error(error: sqlx::Error) -> CampusEventsError {
    if let sqlx::Error::Database(db_error) = &error {
        match db_error.code().as_deref() {
            Some(SQLSTATE_EVENT_FULL) => {
                return CampusEventsError::CapacityExceeded(db_error.message().to_string());
            }
            Some(SQLSTATE_REJECTED) => {
                return CampusEventsError::RegistrationFailed(db_error.message().to_string());
            }
            _ => {}
        }
    }
    CampusEventsError::Database(error)
}
