#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system and throughput accounting for ratewatch
//!
//! Workers and the reporter never print. Everything they want the user to
//! see is sent as an [`AppEvent`] over an unbounded channel and rendered by
//! the CLI.
//!
//! ## Architecture
//!
//! - **Domain events**: general, download, throughput, probe
//! - **Unified `EventEmitter` trait**: one API whether you hold a raw
//!   `EventSender` or a context that owns one
//! - **Progress**: the byte counter and windowed speed estimator

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod progress;
pub use progress::*;

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, FailureContext, GeneralEvent, ProbeEvent, ProbeResult, TaskReport,
    ThroughputEvent, ThroughputSnapshot,
};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the application event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for the application event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Receiver gone means nobody is rendering; keep working
            let _ = sender.send(event);
        }
    }

    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    fn emit_error_with_details(&self, message: impl Into<String>, details: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error_with_details(
            message, details,
        )));
    }

    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    fn emit_operation_failed(&self, operation: impl Into<String>, error: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            error: error.into(),
        }));
    }

    fn emit_download_started(&self, task: impl Into<String>, url: impl Into<String>) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            task: task.into(),
            url: url.into(),
        }));
    }

    fn emit_download_failed(
        &self,
        task: impl Into<String>,
        url: impl Into<String>,
        failure: FailureContext,
        bytes: u64,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Failed {
            task: task.into(),
            url: url.into(),
            failure,
            bytes,
        }));
    }

    fn emit_throughput(&self, snapshot: ThroughputSnapshot) {
        self.emit(AppEvent::Throughput(ThroughputEvent::Tick(snapshot)));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
