//! Export metadata
//!
//! What the operator adds on top of a validated snapshot before a document
//! is rendered: who is responsible, which language, and any images.

use crate::error::ValidationError;
use crate::model::DocumentKind;
use crate::snapshot::{InfrastructureSnapshot, ValidatedSnapshot};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FILE_NAME_FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Document language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" | "pt_br" => Ok(Language::Pt),
            "en" | "en-us" | "en_us" => Ok(Language::En),
            _ => Err(ValidationError::UnknownLanguage(s.to_string())),
        }
    }
}

/// Where an attached image goes in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Architecture,
    Antivirus,
}

impl AttachmentKind {
    /// Multipart field name
    pub fn field_name(&self) -> &'static str {
        match self {
            AttachmentKind::Architecture => "architecture_files",
            AttachmentKind::Antivirus => "antivirus_files",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Operator-supplied export fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub responsible_name: String,
    #[serde(default)]
    pub language: Language,
}

impl ExportMetadata {
    pub fn new(responsible_name: impl Into<String>, language: Language) -> Self {
        Self {
            responsible_name: responsible_name.into(),
            language,
        }
    }

    /// Reject a blank responsible name; checked before anything is sent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.responsible_name.trim().is_empty() {
            return Err(ValidationError::BlankResponsible);
        }
        Ok(())
    }
}

/// JSON part of a document generation request
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequest {
    pub doc_type: DocumentKind,
    pub infra_data: InfrastructureSnapshot,
    pub responsible_name: String,
    pub lang: Language,
}

impl DocumentRequest {
    /// Build the request for an export-ready snapshot
    pub fn new(
        snapshot: &ValidatedSnapshot,
        metadata: &ExportMetadata,
    ) -> Result<Self, ValidationError> {
        metadata.validate()?;
        snapshot.ensure_export_ready()?;
        Ok(Self {
            doc_type: snapshot.document_kind(),
            infra_data: snapshot.scoped(),
            responsible_name: metadata.responsible_name.trim().to_string(),
            lang: metadata.language,
        })
    }
}

/// Strip characters that are not allowed in file names
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .filter(|c| !FILE_NAME_FORBIDDEN.contains(c))
        .collect()
}

/// `Doc_<identifier>_<client>_<YYYYmmdd_HHMMSS>.docx`
pub fn suggested_file_name(kind: DocumentKind, client_name: &str, at: NaiveDateTime) -> String {
    format!(
        "Doc_{}_{}_{}.docx",
        kind.identifier(),
        sanitize_file_component(client_name),
        at.format("%Y%m%d_%H%M%S")
    )
}
