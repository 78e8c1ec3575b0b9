//! Scope selection and the collection request derived from it

use super::OptionId;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of document the collected inventory feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A handful of freshly provisioned instances
    NewHost,
    /// Everything in one compartment
    FullInfra,
    /// OKE clusters and the VCNs they live in
    Kubernetes,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::NewHost,
        DocumentKind::FullInfra,
        DocumentKind::Kubernetes,
    ];

    /// Wire name (`new_host`, `full_infra`, `kubernetes`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::NewHost => "new_host",
            DocumentKind::FullInfra => "full_infra",
            DocumentKind::Kubernetes => "kubernetes",
        }
    }

    /// Short identifier used in generated file names
    pub fn identifier(&self) -> &'static str {
        match self {
            DocumentKind::NewHost => "NewHost",
            DocumentKind::FullInfra => "Infrastructure",
            DocumentKind::Kubernetes => "Kubernetes",
        }
    }

    /// Whether the instance level takes part in the scope
    pub fn uses_instances(&self) -> bool {
        matches!(self, DocumentKind::NewHost)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "new_host" | "newhost" => Ok(DocumentKind::NewHost),
            "full_infra" | "fullinfra" => Ok(DocumentKind::FullInfra),
            "kubernetes" | "oke" => Ok(DocumentKind::Kubernetes),
            _ => Err(ValidationError::UnknownDocumentKind(s.to_string())),
        }
    }
}

/// The operator's current scope.
///
/// Only [`crate::SelectionController`] mutates it; everything else reads
/// clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelection {
    pub region: Option<OptionId>,
    pub document_kind: Option<DocumentKind>,
    pub compartment_id: Option<OptionId>,
    pub compartment_name: Option<String>,
    pub instance_ids: BTreeSet<OptionId>,
}

impl ScopeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure submission gate
    pub fn is_submission_ready(&self) -> bool {
        match self.document_kind {
            Some(DocumentKind::NewHost) => !self.instance_ids.is_empty(),
            Some(_) => self.compartment_id.is_some(),
            None => false,
        }
    }

    /// Explain why the scope cannot be submitted yet
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.payload().map(|_| ())
    }

    /// Build the collection request for this scope
    pub fn payload(&self) -> Result<CollectionPayload, ValidationError> {
        let region = self.region.clone().ok_or(ValidationError::MissingRegion)?;
        let kind = self
            .document_kind
            .ok_or(ValidationError::MissingDocumentKind)?;
        let compartment_id = self
            .compartment_id
            .clone()
            .ok_or(ValidationError::MissingCompartment)?;

        if kind.uses_instances() {
            if self.instance_ids.is_empty() {
                return Err(ValidationError::NoInstancesSelected);
            }
            Ok(CollectionPayload {
                kind,
                region,
                compartment_id,
                compartment_name: self.compartment_name.clone(),
                instance_ids: Some(self.instance_ids.iter().cloned().collect()),
            })
        } else {
            Ok(CollectionPayload {
                kind,
                region,
                compartment_id,
                compartment_name: None,
                instance_ids: None,
            })
        }
    }
}

/// Body of a collection submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPayload {
    #[serde(rename = "doc_type")]
    pub kind: DocumentKind,
    pub region: OptionId,
    pub compartment_id: OptionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_ids: Option<Vec<OptionId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(kind: DocumentKind) -> ScopeSelection {
        ScopeSelection {
            region: Some("sa-saopaulo-1".into()),
            document_kind: Some(kind),
            compartment_id: Some("ocid1.compartment.oc1..prod".into()),
            compartment_name: Some("SERVERS-ACME".to_string()),
            instance_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn test_new_host_needs_instances() {
        let mut s = scope(DocumentKind::NewHost);
        assert!(!s.is_submission_ready());
        assert_eq!(s.validate(), Err(ValidationError::NoInstancesSelected));

        s.instance_ids.insert("ocid1.instance.oc1..a".into());
        assert!(s.is_submission_ready());
        let payload = s.payload().unwrap();
        assert_eq!(payload.instance_ids.unwrap().len(), 1);
        assert_eq!(payload.compartment_name.as_deref(), Some("SERVERS-ACME"));
    }

    #[test]
    fn test_full_infra_needs_only_compartment() {
        let mut s = scope(DocumentKind::FullInfra);
        assert!(s.is_submission_ready());
        let payload = s.payload().unwrap();
        assert!(payload.instance_ids.is_none());
        assert!(payload.compartment_name.is_none());

        s.compartment_id = None;
        assert!(!s.is_submission_ready());
        assert_eq!(s.validate(), Err(ValidationError::MissingCompartment));
    }

    #[test]
    fn test_empty_scope_is_not_ready() {
        let s = ScopeSelection::new();
        assert!(!s.is_submission_ready());
        assert_eq!(s.validate(), Err(ValidationError::MissingRegion));
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = scope(DocumentKind::Kubernetes).payload().unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["doc_type"], "kubernetes");
        assert_eq!(value["region"], "sa-saopaulo-1");
        assert!(value.get("instance_ids").is_none());
    }

    #[test]
    fn test_document_kind_parsing() {
        assert_eq!("new-host".parse::<DocumentKind>(), Ok(DocumentKind::NewHost));
        assert_eq!("FULL_INFRA".parse::<DocumentKind>(), Ok(DocumentKind::FullInfra));
        assert!("report".parse::<DocumentKind>().is_err());
    }
}
