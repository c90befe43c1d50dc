//! State management module
//!
//! Client-side editor state for building and reviewing event changes

pub mod editor;

pub use editor::{
    diff, validate, DraftDifference, DraftField, EditorAction, EditorState, EventDraft, EventType, FieldPatch,
    FieldUpdate, RegistrationState, SaveMode,
};
