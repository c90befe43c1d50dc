//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod profile;
pub mod event;
pub mod form_field;
pub mod registration;
pub mod attendance;
pub mod payment;
pub mod admin_log;

// Re-export commonly used models
pub use profile::{Profile, CreateProfileRequest, Role};
pub use event::{Event, EventWithUsage, CreateEventRequest, UpdateEventRequest, EventStatus, Visibility};
pub use form_field::{FormField, FormFieldInput, CreateFormFieldRequest, UpdateFormFieldRequest, FieldReconciliation, FormFieldControlRow, FieldType};
pub use registration::{
    Registration, Answer, RegistrationResponse, CreateManualRegistrationRequest, RegistrationListRow,
    RegistrationFilter, PaymentType, RegistrationSource, TicketRow, RegistrationStatus,
};
pub use attendance::{Attendance, AttendanceListRow, CheckInTarget, CheckInOutcome, EventAttendanceStats};
pub use payment::{Payment, CreatePaymentRequest, PaymentListRow, PaymentFilter, PaymentStatus};
pub use admin_log::{AdminLog, AdminLogRow, CreateAdminLogRequest, AdminLogFilter};
