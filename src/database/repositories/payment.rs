//! Payment repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::payment::{Payment, PaymentListRow, PaymentFilter, CreatePaymentRequest};
use crate::utils::errors::CampusEventsError;

const PAYMENT_COLUMNS: &str = "id, registration_id, event_id, user_id, amount, currency, status, \
    razorpay_order_id, razorpay_payment_id, razorpay_signature, created_at, updated_at";

const LIST_SELECT: &str = r#"
    SELECT pay.id, pay.registration_id, pay.event_id, pay.user_id, pay.amount, pay.currency, pay.status,
           pay.razorpay_order_id, pay.razorpay_payment_id, pay.created_at,
           r.status AS registration_status, e.title AS event_title,
           p.full_name AS user_full_name, p.email AS user_email
    FROM payments pay
    LEFT JOIN registrations r ON r.id = pay.registration_id
    LEFT JOIN events e ON e.id = pay.event_id
    LEFT JOIN profiles p ON p.id = pay.user_id
"#;

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a gateway order for a pending registration
    pub async fn create(&self, request: CreatePaymentRequest) -> Result<Payment, CampusEventsError> {
        let now = Utc::now();
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (registration_id, event_id, user_id, amount, currency, status, razorpay_order_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'CREATED', $6, $7, $7)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(request.registration_id)
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(request.amount)
        .bind(request.currency)
        .bind(request.razorpay_order_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Find payment by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, CampusEventsError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Point a payment at the registration it paid for
    pub async fn link_registration(&self, id: Uuid, registration_id: Uuid) -> Result<(), CampusEventsError> {
        sqlx::query("UPDATE payments SET registration_id = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(registration_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Payments with their registration status, newest first
    pub async fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentListRow>, CampusEventsError> {
        let rows = sqlx::query_as::<_, PaymentListRow>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR pay.status = $1)
              AND ($2::uuid IS NULL OR pay.event_id = $2)
            ORDER BY pay.created_at DESC
            "#,
            LIST_SELECT
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Successful payments whose registration is missing or not confirmed
    pub async fn list_suspicious(&self) -> Result<Vec<PaymentListRow>, CampusEventsError> {
        let rows = sqlx::query_as::<_, PaymentListRow>(&format!(
            r#"
            {}
            WHERE pay.status = 'SUCCESS' AND (r.id IS NULL OR r.status <> 'CONFIRMED')
            ORDER BY pay.created_at DESC
            "#,
            LIST_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
