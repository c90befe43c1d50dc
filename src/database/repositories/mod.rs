//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod profile;
pub mod event;
pub mod form_field;
pub mod registration;
pub mod attendance;
pub mod payment;
pub mod admin_log;

// Re-export repositories
pub use profile::ProfileRepository;
pub use event::EventRepository;
pub use form_field::FormFieldRepository;
pub use registration::{RegistrationRepository, LabeledResponse};
pub use attendance::AttendanceRepository;
pub use payment::PaymentRepository;
pub use admin_log::AdminLogRepository;
