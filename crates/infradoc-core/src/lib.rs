//! infradoc core
//!
//! Synchronous domain model for infradoc: everything that decides *what* is
//! selected and *whether* a collected inventory is usable, with no I/O.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 infradoc-cloud                    │
//! │      (SessionController, CollectionTaskClient)    │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//! ┌─────────────────▼────────────────────────────────┐
//! │                 infradoc-core                     │
//! │  ┌────────────┐ ┌───────────┐ ┌────────────────┐ │
//! │  │ OptionTree │ │  Filter   │ │   Selection    │ │
//! │  └────────────┘ └───────────┘ └────────────────┘ │
//! │  ┌──────────────────────┐ ┌───────────────────┐  │
//! │  │  Snapshot Resolver   │ │  Export metadata  │  │
//! │  └──────────────────────┘ └───────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod selection;
pub mod snapshot;
pub mod tree;

// Re-exports
pub use error::{CoreError, Result, ValidationError};
pub use export::{
    Attachment, AttachmentKind, DocumentRequest, ExportMetadata, Language, suggested_file_name,
};
pub use filter::{FilterResult, Visibility, apply_filter};
pub use model::{
    CollectionPayload, DocumentKind, OptionId, OptionKind, OptionNode, RawOption, ScopeSelection,
};
pub use selection::{SelectionController, SelectionUpdate};
pub use snapshot::{
    CryptoAssessment, InfrastructureSnapshot, Resolution, ValidatedSnapshot, assess_tunnel, resolve,
};
pub use tree::{
    HierarchyEntry, OptionLevel, OptionTree, ReloadTicket, check_depth_order, flatten_hierarchy,
    normalize_options,
};
