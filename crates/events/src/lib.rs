#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in hotswap
//!
//! Every stage of a sync reports through events instead of printing. Library
//! crates hold an optional [`EventSender`]; the CLI drains the receiver and
//! forwards each event to tracing.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by stage (Sync, Install, Deploy, State)
//! - **`EventEmitter` trait**: one API for emitting from anything holding a sender
//! - **Tracing integration**: each event carries its own level and log target

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, DeployEvent, FailureContext, GeneralEvent, InstallEvent, StateEvent, SyncEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout hotswap
///
/// Implemented for the raw `EventSender` and for any component that keeps an
/// optional sender around.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Receiver gone means nobody is listening; keep going
            let _ = sender.send(event);
        }
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, error: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            error: error.into(),
        }));
    }

    /// Emit a sync status transition
    fn emit_sync_status(&self, status: hotswap_types::SyncStatus) {
        self.emit(AppEvent::Sync(SyncEvent::StatusChanged { status }));
    }

    /// Emit an install phase transition
    fn emit_install_phase(
        &self,
        package_hash: impl Into<String>,
        phase: hotswap_types::InstallPhase,
    ) {
        self.emit(AppEvent::Install(InstallEvent::PhaseEntered {
            package_hash: package_hash.into(),
            phase,
        }));
    }
}

/// Lets a bare `EventSender` be used wherever an `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
