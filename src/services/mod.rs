//! Services module
//!
//! This module contains business logic services

pub mod attendance;
pub mod audit;
pub mod check_in;
pub mod events;
pub mod exports;
pub mod form_control;
pub mod manual_fixes;
pub mod overview;
pub mod payments;
pub mod redis;
pub mod registration;
pub mod registration_admin;
pub mod storage;
pub mod tickets;
pub mod users;

// Re-export commonly used services
pub use attendance::{AttendanceService, AttendanceView, compute_event_stats, compute_stats};
pub use audit::{AuditLogger, LogQuery, LogRange, LogsView};
pub use check_in::CheckInService;
pub use events::{EventAdminService, EventCatalog, EventDetail, EventSummary};
pub use exports::{CsvExport, ExportService, ExportType};
pub use form_control::{FieldControlAction, FormControlService};
pub use manual_fixes::{ManualFix, ManualFixForm, ManualFixService, PaymentsView};
pub use overview::{OverviewMetrics, OverviewService};
pub use payments::{GatewayOrder, PaymentGateway, RazorpayGateway};
pub use redis::RedisService;
pub use registration::{ConfirmMode, RegisterRequest, RegisterResponse, RegistrationService};
pub use registration_admin::{RegistrationAction, RegistrationAdminService};
pub use storage::{FileStorage, StoredFile};
pub use tickets::{TicketService, TicketView};
pub use users::{UserAction, UserAdminService};

use std::sync::Arc;
use serde::Serialize;
use crate::config::settings::Settings;
use crate::database::{self, DatabaseService};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub catalog: EventCatalog,
    pub event_admin: EventAdminService,
    pub registration: RegistrationService,
    pub check_in: CheckInService,
    pub attendance: AttendanceService,
    pub tickets: TicketService,
    pub exports: ExportService,
    pub registration_admin: RegistrationAdminService,
    pub manual_fixes: ManualFixService,
    pub form_control: FormControlService,
    pub users: UserAdminService,
    pub overview: OverviewService,
    pub audit: AuditLogger,
    db: DatabaseService,
    redis: Option<RedisService>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        settings: &Settings,
        db: DatabaseService,
        redis: Option<RedisService>,
        storage: FileStorage,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let audit = AuditLogger::new(db.clone());

        Self {
            catalog: EventCatalog::new(db.clone()),
            event_admin: EventAdminService::new(db.clone(), settings.payments.currency.clone()),
            registration: RegistrationService::new(db.clone(), settings.payments.clone(), gateway, storage),
            check_in: CheckInService::new(db.clone(), audit.clone()),
            attendance: AttendanceService::new(db.clone()),
            tickets: TicketService::new(db.clone()),
            exports: ExportService::new(db.clone(), audit.clone()),
            registration_admin: RegistrationAdminService::new(db.clone(), audit.clone()),
            manual_fixes: ManualFixService::new(db.clone(), audit.clone()),
            form_control: FormControlService::new(db.clone(), audit.clone()),
            users: UserAdminService::new(db.clone(), audit.clone()),
            overview: OverviewService::new(db.clone(), settings.payments.enabled),
            audit,
            db,
            redis,
        }
    }

    /// Build the payment gateway when payments are enabled
    pub fn payment_gateway(settings: &Settings) -> Result<Option<Arc<dyn PaymentGateway>>> {
        if !settings.payments.enabled {
            return Ok(None);
        }
        let gateway: Arc<dyn PaymentGateway> = Arc::new(RazorpayGateway::new(&settings.payments)?);
        Ok(Some(gateway))
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = database::health_check(self.db.pool()).await.is_ok();
        let redis_healthy = match &self.redis {
            Some(redis) => Some(redis.health_check().await.unwrap_or(false)),
            None => None,
        };

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    /// `None` when no Redis backend is configured
    pub redis_healthy: Option<bool>,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.redis_healthy.unwrap_or(true)
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
