//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use hotswap_events::{AppEvent, SyncEvent};

/// Routes events to tracing and sync statuses to the terminal
pub struct EventHandler {
    json_mode: bool,
}

impl EventHandler {
    pub fn new(json_mode: bool) -> Self {
        Self { json_mode }
    }

    pub fn handle_event(&mut self, event: &AppEvent) {
        log_event_with_tracing(event);

        // Everything else reaches the terminal through the tracing subscriber
        if let (false, AppEvent::Sync(SyncEvent::StatusChanged { status })) =
            (self.json_mode, event)
        {
            println!("{status}");
        }
    }
}
