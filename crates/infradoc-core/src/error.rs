//! Core error types

use crate::tree::OptionLevel;
use thiserror::Error;

/// Errors raised while building option lists or checking a scope
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to load {level} options: {message}")]
    ScopeLoad { level: OptionLevel, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn scope_load(level: OptionLevel, message: impl Into<String>) -> Self {
        CoreError::ScopeLoad {
            level,
            message: message.into(),
        }
    }
}

/// A required field is missing or a value is unusable.
///
/// Always recoverable: the caller fixes the input and tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No region selected")]
    MissingRegion,

    #[error("No document kind selected")]
    MissingDocumentKind,

    #[error("No compartment selected")]
    MissingCompartment,

    #[error("Select at least one instance")]
    NoInstancesSelected,

    #[error("Responsible person name must not be blank")]
    BlankResponsible,

    #[error("Unknown document kind: {0}")]
    UnknownDocumentKind(String),

    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),

    #[error("Duplicate {collection} id in snapshot: {id}")]
    DuplicateIdentity { collection: &'static str, id: String },

    #[error("Snapshot has no {0} data to export")]
    NotExportReady(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
