//! Postgres access: pool setup, migrations and one repository per table

pub mod connection;
pub mod repositories;
pub mod service;

pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use repositories::{
    ProfileRepository, EventRepository, FormFieldRepository, RegistrationRepository, AttendanceRepository,
    PaymentRepository, AdminLogRepository, LabeledResponse,
};
pub use service::DatabaseService;
