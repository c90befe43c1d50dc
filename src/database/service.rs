//! Database service layer
//!
//! This module provides a high-level interface to database operations

use uuid::Uuid;
use crate::database::{
    DatabasePool, ProfileRepository, EventRepository, FormFieldRepository, RegistrationRepository,
    AttendanceRepository, PaymentRepository, AdminLogRepository,
};
use crate::models::*;
use crate::utils::errors::CampusEventsError;

#[derive(Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub profiles: ProfileRepository,
    pub events: EventRepository,
    pub form_fields: FormFieldRepository,
    pub registrations: RegistrationRepository,
    pub attendance: AttendanceRepository,
    pub payments: PaymentRepository,
    pub admin_logs: AdminLogRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            form_fields: FormFieldRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            admin_logs: AdminLogRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Create an event, its form fields and the audit entry atomically
    pub async fn create_event_with_fields(
        &self,
        request: CreateEventRequest,
        fields: Vec<FormFieldInput>,
        log_action: &str,
        log_details: impl FnOnce(&Event, &[FormField]) -> serde_json::Value,
    ) -> Result<(Event, Vec<FormField>), CampusEventsError> {
        let admin_id = request.created_by;
        let mut tx = self.pool.begin().await?;

        let event = EventRepository::insert(&mut tx, request).await?;

        let mut created = Vec::with_capacity(fields.len());
        for (position, field) in fields.into_iter().enumerate() {
            let inserted = FormFieldRepository::insert(
                &mut tx,
                CreateFormFieldRequest {
                    event_id: event.id,
                    label: field.label,
                    field_type: field.field_type,
                    required: field.required,
                    options: field.options,
                    position: position as i32,
                },
            )
            .await?;
            created.push(inserted);
        }

        let details = log_details(&event, &created);
        AdminLogRepository::insert(&mut tx, CreateAdminLogRequest::new(admin_id, log_action, details)).await?;

        tx.commit().await?;
        Ok((event, created))
    }

    /// Load an event and its fields inside a transaction, locking the event row
    pub async fn begin_event_update(
        &self,
        event_id: Uuid,
    ) -> Result<(sqlx::Transaction<'static, sqlx::Postgres>, Option<(Event, Vec<FormField>, i64)>), CampusEventsError> {
        let mut tx = self.pool.begin().await?;

        let Some(event) = EventRepository::find_for_update(&mut tx, event_id, true).await? else {
            return Ok((tx, None));
        };
        let fields = FormFieldRepository::list_for_event_on(&mut tx, event_id).await?;
        let confirmed = EventRepository::count_confirmed(&mut tx, event_id).await?;

        Ok((tx, Some((event, fields, confirmed))))
    }

    /// Apply an event update, its field reconciliation and the audit entry, then commit
    pub async fn finish_event_update(
        &self,
        mut tx: sqlx::Transaction<'static, sqlx::Postgres>,
        event_id: Uuid,
        update: UpdateEventRequest,
        reconciliation: FieldReconciliation,
        log: CreateAdminLogRequest,
    ) -> Result<Event, CampusEventsError> {
        let event = EventRepository::update(&mut tx, event_id, update).await?;

        for field in reconciliation.updates {
            FormFieldRepository::update(&mut tx, field).await?;
        }
        for field in reconciliation.inserts {
            FormFieldRepository::insert(&mut tx, field).await?;
        }

        AdminLogRepository::insert(&mut tx, log).await?;

        tx.commit().await?;
        Ok(event)
    }

    /// Create a student profile for an attendee who never signed up online
    pub async fn find_or_create_profile(&self, email: &str, full_name: &str) -> Result<(Profile, bool), CampusEventsError> {
        if let Some(existing) = self.profiles.find_by_email(email).await? {
            return Ok((existing, false));
        }

        let profile = self
            .profiles
            .create(CreateProfileRequest {
                id: Uuid::new_v4(),
                full_name: Some(full_name.trim().to_string()),
                email: email.to_string(),
                role: Role::Student,
            })
            .await?;

        Ok((profile, true))
    }
}
