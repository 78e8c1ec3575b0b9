//! Session notifications
//!
//! Every user-visible outcome, including all fatal errors, goes through one
//! unbounded channel of [`SessionEvent`]s.

use infradoc_core::OptionLevel;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A level finished loading
    LevelLoaded { level: OptionLevel, count: usize },
    /// A level failed to load and was left empty
    LevelFailed { level: OptionLevel, message: String },
    /// The server accepted a collection request
    TaskAccepted { task_id: String },
    TaskProgress { percent: u8, step: String },
    TaskSucceeded { task_id: String },
    /// The collection request was rejected; the client is idle again
    SubmissionFailed { message: String },
    /// The task reached the server-side failure state
    ServerFailure { task_id: String, message: String },
    /// Polling failed before completion
    NetworkError { task_id: String, message: String },
    /// The live task was dropped by a reset
    TaskCancelled { task_id: String },
    /// The resolved snapshot changed the export gate
    ExportReady { ready: bool },
}

impl SessionEvent {
    /// Whether this notification reports a fatal error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SessionEvent::LevelFailed { .. }
                | SessionEvent::SubmissionFailed { .. }
                | SessionEvent::ServerFailure { .. }
                | SessionEvent::NetworkError { .. }
        )
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send without caring whether anyone still listens
pub(crate) fn emit(sender: &EventSender, event: SessionEvent) {
    if sender.send(event).is_err() {
        tracing::debug!("Session event dropped, no receiver");
    }
}
