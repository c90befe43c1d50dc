//! HTTP client module
//!
//! Typed access to the API for the student registration form, the door
//! console, and the admin event editor.

pub mod api;
pub mod attendance;
pub mod editor;
pub mod registration;

pub use api::{ApiClient, ApiErrorBody};
pub use attendance::{AttendanceConsole, CheckInReply};
pub use editor::EventEditorSession;
pub use registration::{DraftAnswer, FileAttachment, PublicEvent, RegistrationClient, RegistrationOutcome};
