//! Manual remediation of registrations that the online flow failed to create

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{
    CreateManualRegistrationRequest, PaymentFilter, PaymentListRow, Profile, Registration, RegistrationStatus,
};
use crate::services::audit::AuditLogger;
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::helpers::{generate_manual_entry_code, non_blank};

pub const ACTION_PAYMENT_FIX: &str = "MANUAL_FIX_PAYMENT_SUCCESS_BUT_REG_MISSING";
pub const ACTION_ADD_USER: &str = "MANUAL_ADD_USER_INTERNET_FAILED";
pub const ACTION_OFFLINE: &str = "MANUAL_OFFLINE_REGISTRATION";

/// Raw form of the manual fixes page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFixForm {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub offline_event_id: Option<String>,
    #[serde(default)]
    pub offline_user_name: Option<String>,
    #[serde(default)]
    pub offline_user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualFix {
    PaymentSuccessButRegistrationMissing { payment_id: Uuid },
    AddUserManually { email: String, event_id: Uuid },
    AddOfflineRegistration { full_name: String, email: String, event_id: Uuid },
}

fn required_id(value: &Option<String>, name: &str) -> Result<Uuid> {
    let raw = non_blank(value.as_deref()).ok_or_else(|| CampusEventsError::Validation(format!("Missing {}", name)))?;
    Uuid::parse_str(&raw).map_err(|_| CampusEventsError::Validation(format!("Invalid {}", name)))
}

fn required_text(value: &Option<String>, name: &str) -> Result<String> {
    non_blank(value.as_deref()).ok_or_else(|| CampusEventsError::Validation(format!("Missing {}", name)))
}

impl ManualFix {
    pub fn from_form(form: &ManualFixForm) -> Result<Self> {
        match form.action.as_deref().map(str::trim) {
            Some("fix_payment_success_but_registration_missing") => Ok(ManualFix::PaymentSuccessButRegistrationMissing {
                payment_id: required_id(&form.payment_id, "paymentId")?,
            }),
            Some("add_user_manually") => Ok(ManualFix::AddUserManually {
                email: required_text(&form.user_email, "userEmail")?.to_lowercase(),
                event_id: required_id(&form.event_id, "eventId")?,
            }),
            Some("add_offline_registration") => Ok(ManualFix::AddOfflineRegistration {
                full_name: required_text(&form.offline_user_name, "offlineUserName")?,
                email: required_text(&form.offline_user_email, "offlineUserEmail")?.to_lowercase(),
                event_id: required_id(&form.offline_event_id, "offlineEventId")?,
            }),
            Some(other) if !other.is_empty() => Err(CampusEventsError::Validation(format!("Unknown action: {}", other))),
            _ => Err(CampusEventsError::Validation("Missing action".to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ManualFix::PaymentSuccessButRegistrationMissing { .. } => ACTION_PAYMENT_FIX,
            ManualFix::AddUserManually { .. } => ACTION_ADD_USER,
            ManualFix::AddOfflineRegistration { .. } => ACTION_OFFLINE,
        }
    }

    /// Status shown on the page after a successful fix
    pub fn success_status(&self) -> &'static str {
        match self {
            ManualFix::PaymentSuccessButRegistrationMissing { .. } => "payment_fix_success",
            ManualFix::AddUserManually { .. } => "manual_add_success",
            ManualFix::AddOfflineRegistration { .. } => "offline_add_success",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManualFixOutcome {
    pub registration: Registration,
    /// False when an existing registration was confirmed instead
    pub created: bool,
}

/// Payments page: the filtered list plus the standing suspicious list
#[derive(Debug, Clone, Serialize)]
pub struct PaymentsView {
    pub payments: Vec<PaymentListRow>,
    pub suspicious: Vec<PaymentListRow>,
}

#[derive(Clone)]
pub struct ManualFixService {
    db: DatabaseService,
    audit: AuditLogger,
}

impl ManualFixService {
    pub fn new(db: DatabaseService, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    /// Successful payments without a confirmed registration
    pub async fn suspicious_payments(&self) -> Result<Vec<PaymentListRow>> {
        self.db.payments.list_suspicious().await
    }

    pub async fn payments(&self, filter: &PaymentFilter) -> Result<PaymentsView> {
        let (payments, suspicious) = futures::try_join!(
            self.db.payments.list(filter),
            self.db.payments.list_suspicious(),
        )?;
        Ok(PaymentsView { payments, suspicious })
    }

    async fn ensure_event(&self, event_id: Uuid) -> Result<()> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| CampusEventsError::NotFound("Event not found".to_string()))
    }

    /// Confirm the user's registration for the event, creating a manual one if none exists
    async fn ensure_confirmed(&self, user_id: Uuid, event_id: Uuid) -> Result<ManualFixOutcome> {
        match self.db.registrations.find_for_user_and_event(user_id, event_id).await? {
            Some(existing) if existing.status() == RegistrationStatus::Confirmed => Ok(ManualFixOutcome {
                registration: existing,
                created: false,
            }),
            Some(existing) => {
                let registration = self
                    .db
                    .registrations
                    .update_status(existing.id, RegistrationStatus::Confirmed)
                    .await?;
                Ok(ManualFixOutcome { registration, created: false })
            }
            None => {
                let registration = self
                    .db
                    .registrations
                    .create_manual(CreateManualRegistrationRequest {
                        event_id,
                        user_id,
                        entry_code: generate_manual_entry_code(Utc::now()),
                    })
                    .await?;
                Ok(ManualFixOutcome { registration, created: true })
            }
        }
    }

    pub async fn apply(&self, admin: &Profile, fix: ManualFix) -> Result<ManualFixOutcome> {
        let (outcome, details) = match &fix {
            ManualFix::PaymentSuccessButRegistrationMissing { payment_id } => {
                let payment = self
                    .db
                    .payments
                    .find_by_id(*payment_id)
                    .await?
                    .ok_or_else(|| CampusEventsError::NotFound("Payment not found".to_string()))?;
                let (Some(user_id), Some(event_id)) = (payment.user_id, payment.event_id) else {
                    return Err(CampusEventsError::Validation("Payment has no user or event".to_string()));
                };

                let outcome = self.ensure_confirmed(user_id, event_id).await?;
                self.db.payments.link_registration(payment.id, outcome.registration.id).await?;

                let details = json!({
                    "payment_id": payment.id,
                    "user_id": user_id,
                    "event_id": event_id,
                    "amount": payment.amount,
                    "razorpay_payment_id": payment.razorpay_payment_id,
                    "registration_id": outcome.registration.id,
                    "entry_code": outcome.registration.entry_code,
                    "created": outcome.created,
                });
                (outcome, details)
            }
            ManualFix::AddUserManually { email, event_id } => {
                self.ensure_event(*event_id).await?;
                let profile = self
                    .db
                    .profiles
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| CampusEventsError::NotFound("User not found".to_string()))?;

                let outcome = self.ensure_confirmed(profile.id, *event_id).await?;
                let details = json!({
                    "user_email": email,
                    "user_id": profile.id,
                    "event_id": event_id,
                    "registration_id": outcome.registration.id,
                    "entry_code": outcome.registration.entry_code,
                    "created": outcome.created,
                });
                (outcome, details)
            }
            ManualFix::AddOfflineRegistration { full_name, email, event_id } => {
                self.ensure_event(*event_id).await?;
                let (profile, profile_created) = self.db.find_or_create_profile(email, full_name).await?;

                let outcome = self.ensure_confirmed(profile.id, *event_id).await?;
                let details = json!({
                    "user_email": email,
                    "user_name": full_name,
                    "user_id": profile.id,
                    "profile_created": profile_created,
                    "event_id": event_id,
                    "registration_id": outcome.registration.id,
                    "entry_code": outcome.registration.entry_code,
                    "created": outcome.created,
                });
                (outcome, details)
            }
        };

        self.audit.record(admin.id, fix.action(), details).await?;
        info!(
            action = fix.action(),
            registration_id = %outcome.registration.id,
            created = outcome.created,
            "Manual fix applied"
        );
        Ok(outcome)
    }
}
