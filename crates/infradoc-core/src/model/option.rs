//! Selectable options (regions, compartments, instances)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a selectable option
///
/// For regions this is the region name (`sa-saopaulo-1`), for compartments and
/// instances the provider OCID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(String);

impl OptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OptionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What an option stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Region,
    Compartment,
    Instance,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Region => write!(f, "region"),
            OptionKind::Compartment => write!(f, "compartment"),
            OptionKind::Instance => write!(f, "instance"),
        }
    }
}

/// One entry of a flattened, depth-annotated option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionNode {
    pub id: OptionId,

    pub display_name: String,

    /// 0 for root-level entries
    pub depth: u32,

    pub kind: OptionKind,

    /// Display-only extra: region key or instance lifecycle state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl OptionNode {
    pub fn new(id: impl Into<OptionId>, display_name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            depth: 0,
            kind,
            detail: None,
        }
    }

    pub fn at_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Option entry as it arrives from the inventory service.
///
/// The service is loose about field names (`key`/`id`, `name`/`display_name`,
/// `level`/`depth`); [`RawOption::normalize`] is the only place that looks at
/// which ones are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RawOption {
    /// Convert into the canonical node shape for the given kind
    pub fn normalize(self, kind: OptionKind) -> Result<OptionNode, String> {
        match kind {
            OptionKind::Region => {
                // Regions are addressed by name; the short key is only shown.
                let name = non_empty(self.name)
                    .or_else(|| non_empty(self.display_name))
                    .ok_or_else(|| "region entry has no name".to_string())?;
                let mut node = OptionNode::new(name.clone(), name, kind);
                if let Some(key) = non_empty(self.key) {
                    node = node.with_detail(key);
                }
                Ok(node)
            }
            OptionKind::Compartment => {
                let id = non_empty(self.id)
                    .or_else(|| non_empty(self.key))
                    .ok_or_else(|| "compartment entry has no id".to_string())?;
                let name = non_empty(self.name)
                    .or_else(|| non_empty(self.display_name))
                    .ok_or_else(|| format!("compartment {} has no name", id))?;
                let depth = self.level.or(self.depth).unwrap_or(0);
                Ok(OptionNode::new(id, name, kind).at_depth(depth))
            }
            OptionKind::Instance => {
                let id = non_empty(self.id)
                    .or_else(|| non_empty(self.key))
                    .ok_or_else(|| "instance entry has no id".to_string())?;
                let name = non_empty(self.display_name)
                    .or_else(|| non_empty(self.name))
                    .ok_or_else(|| format!("instance {} has no display name", id))?;
                let mut node = OptionNode::new(id, name, kind);
                if let Some(status) = non_empty(self.status) {
                    node = node.with_detail(status);
                }
                Ok(node)
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
