//! Event editing against the admin API

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use crate::client::api::ApiClient;
use crate::models::{Event, FormField};
use crate::state::editor::{DraftDifference, EditorAction, EditorState, EventDraft};
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
struct SavedEvent {
    event: Event,
}

#[derive(Debug)]
pub struct EventEditorSession {
    api: ApiClient,
    event_id: Uuid,
    baseline: EventDraft,
    state: EditorState,
    allow_capacity_override: bool,
}

impl EventEditorSession {
    pub fn new(api: ApiClient, event: &Event, fields: &[FormField]) -> Self {
        let baseline = EventDraft::from_event(event, fields);
        Self {
            api,
            event_id: event.id,
            state: EditorState::new(baseline.clone()),
            baseline,
            allow_capacity_override: false,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn dispatch(&mut self, action: EditorAction) {
        self.state.dispatch(action);
    }

    /// Permit lowering capacity below the confirmed count
    pub fn allow_capacity_override(&mut self, allow: bool) {
        self.allow_capacity_override = allow;
    }

    /// Changes the confirmation dialog lists
    pub fn review(&mut self, today: NaiveDate) -> Result<Vec<DraftDifference>> {
        self.state.check_submission(&self.baseline, today)
    }

    pub async fn save(&mut self, today: NaiveDate) -> Result<Event> {
        let differences = self.review(today)?;

        self.state.dispatch(EditorAction::SetSubmitting(true));
        let payload = self.state.data.update_payload(self.event_id, self.allow_capacity_override);
        let saved: Result<SavedEvent> = self.api.post_json("/api/admin/update-event", &payload).await;
        self.state.dispatch(EditorAction::SetSubmitting(false));

        let saved = saved?;
        info!(event_id = %self.event_id, changes = differences.len(), "Event saved");

        self.baseline = self.state.data.clone();
        self.state.show_confirmation = false;
        Ok(saved.event)
    }
}
