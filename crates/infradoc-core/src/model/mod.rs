//! Canonical option and scope types

mod option;
mod scope;

pub use option::{OptionId, OptionKind, OptionNode, RawOption};
pub use scope::{CollectionPayload, DocumentKind, ScopeSelection};
