//! infradoc Cloud Orchestration
//!
//! Talks to the inventory service and drives one operator session: option
//! loading for each scope level, the collection task lifecycle, snapshot
//! resolution and document export.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  infradoc CLI                    │
//! │           (collect / export / lang)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 infradoc-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │           SessionController               │   │
//! │  │  SessionContext { selection, tree, .. }   │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────────────┐  ┌──────────────────┐   │
//! │  │ CollectionTask     │  │  SessionEvent    │   │
//! │  │ Client (poll+tick) │  │  channel         │   │
//! │  └────────────────────┘  └──────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼──────────────────────┐
//! │ trait InventoryBackend       │
//! │   └─ HttpBackend (reqwest)   │
//! └──────────────────────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod events;
pub mod http;
pub mod session;
pub mod task;

// Re-exports
pub use backend::{
    InventoryBackend, PLACEHOLDER_PERCENT, ProgressInfo, TaskHandle, TaskState,
    TaskStatusResponse,
};
pub use error::{CloudError, Result};
pub use events::{EventReceiver, EventSender, SessionEvent};
pub use http::{HttpBackend, HttpConfig};
pub use session::{ExportedDocument, PendingReload, SessionContext, SessionController};
pub use task::{
    CollectionTaskClient, PollConfig, PollOutcome, PollStep, TaskPhase, TaskView, WorkerState,
};
