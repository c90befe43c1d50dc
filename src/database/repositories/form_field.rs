//! Form field repository implementation

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use chrono::Utc;
use uuid::Uuid;
use crate::models::form_field::{
    FormField, FormFieldControlRow, CreateFormFieldRequest, UpdateFormFieldRequest, FORM_FIELD_COLUMNS,
};
use crate::utils::errors::CampusEventsError;

#[derive(Clone)]
pub struct FormFieldRepository {
    pool: PgPool,
}

impl FormFieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a field; its requirement baseline is the initial `required`
    pub async fn insert(conn: &mut PgConnection, request: CreateFormFieldRequest) -> Result<FormField, CampusEventsError> {
        let options = if request.options.is_empty() { None } else { Some(Json(request.options)) };
        let field = sqlx::query_as::<_, FormField>(&format!(
            r#"
            INSERT INTO event_form_fields (event_id, label, field_type, required, options, position, original_required, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $4, $7)
            RETURNING {}
            "#,
            FORM_FIELD_COLUMNS
        ))
        .bind(request.event_id)
        .bind(request.label)
        .bind(request.field_type.as_str())
        .bind(request.required)
        .bind(options)
        .bind(request.position)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(field)
    }

    /// Write the complete new state of an existing field
    pub async fn update(conn: &mut PgConnection, request: UpdateFormFieldRequest) -> Result<FormField, CampusEventsError> {
        let options = if request.options.is_empty() { None } else { Some(Json(request.options)) };
        let field = sqlx::query_as::<_, FormField>(&format!(
            r#"
            UPDATE event_form_fields
            SET label = $2,
                field_type = $3,
                required = $4,
                options = $5,
                position = $6,
                disabled = $7,
                disabled_by = $8,
                disabled_at = $9,
                original_required = $10,
                overridden_by = $11,
                overridden_at = $12
            WHERE id = $1
            RETURNING {}
            "#,
            FORM_FIELD_COLUMNS
        ))
        .bind(request.id)
        .bind(request.label)
        .bind(request.field_type.as_str())
        .bind(request.required)
        .bind(options)
        .bind(request.position)
        .bind(request.disabled)
        .bind(request.disabled_by)
        .bind(request.disabled_at)
        .bind(request.original_required)
        .bind(request.overridden_by)
        .bind(request.overridden_at)
        .fetch_one(conn)
        .await?;

        Ok(field)
    }

    /// Every field of an event, disabled ones included, in form order
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<FormField>, CampusEventsError> {
        let mut conn = self.pool.acquire().await?;
        Self::list_for_event_on(&mut conn, event_id).await
    }

    pub async fn list_for_event_on(conn: &mut PgConnection, event_id: Uuid) -> Result<Vec<FormField>, CampusEventsError> {
        let fields = sqlx::query_as::<_, FormField>(&format!(
            "SELECT {} FROM event_form_fields WHERE event_id = $1 ORDER BY position ASC, created_at ASC",
            FORM_FIELD_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(fields)
    }

    /// Fields a registrant currently has to answer
    pub async fn list_active_for_event(&self, event_id: Uuid) -> Result<Vec<FormField>, CampusEventsError> {
        let fields = self.list_for_event(event_id).await?;
        Ok(fields.into_iter().filter(|f| !f.disabled).collect())
    }

    /// Find field by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FormField>, CampusEventsError> {
        let field = sqlx::query_as::<_, FormField>(&format!(
            "SELECT {} FROM event_form_fields WHERE id = $1",
            FORM_FIELD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(field)
    }

    /// Soft-disable or re-enable a field
    pub async fn set_disabled(&self, id: Uuid, disabled: bool, admin_id: Uuid) -> Result<FormField, CampusEventsError> {
        let field = sqlx::query_as::<_, FormField>(&format!(
            r#"
            UPDATE event_form_fields
            SET disabled = $2,
                disabled_by = CASE WHEN $2 THEN $3 ELSE NULL END,
                disabled_at = CASE WHEN $2 THEN $4 ELSE NULL END
            WHERE id = $1
            RETURNING {}
            "#,
            FORM_FIELD_COLUMNS
        ))
        .bind(id)
        .bind(disabled)
        .bind(admin_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Override `required`, keeping the baseline in `original_required`
    pub async fn override_required(&self, id: Uuid, required: bool, admin_id: Uuid) -> Result<FormField, CampusEventsError> {
        let field = sqlx::query_as::<_, FormField>(&format!(
            r#"
            UPDATE event_form_fields
            SET original_required = COALESCE(original_required, required),
                required = $2,
                overridden_by = $3,
                overridden_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            FORM_FIELD_COLUMNS
        ))
        .bind(id)
        .bind(required)
        .bind(admin_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Restore the baseline requirement and clear the override
    pub async fn remove_override(&self, id: Uuid) -> Result<FormField, CampusEventsError> {
        let field = sqlx::query_as::<_, FormField>(&format!(
            r#"
            UPDATE event_form_fields
            SET required = COALESCE(original_required, required),
                overridden_by = NULL,
                overridden_at = NULL
            WHERE id = $1
            RETURNING {}
            "#,
            FORM_FIELD_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Fields of approved events with their response counts
    pub async fn list_for_control(&self) -> Result<Vec<FormFieldControlRow>, CampusEventsError> {
        let columns = FORM_FIELD_COLUMNS
            .split(", ")
            .map(|c| format!("f.{}", c))
            .collect::<Vec<_>>()
            .join(", ");

        let rows = sqlx::query_as::<_, FormFieldControlRow>(&format!(
            r#"
            SELECT {}, e.title AS event_title,
                   (SELECT COUNT(*) FROM registration_responses rr WHERE rr.field_id = f.id) AS response_count
            FROM event_form_fields f
            INNER JOIN events e ON e.id = f.event_id
            WHERE e.status = 'approved'
            ORDER BY e.event_date ASC, f.position ASC, f.created_at ASC
            "#,
            columns
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
