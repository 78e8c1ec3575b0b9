//! Inventory backend trait definition

use crate::error::Result;
use async_trait::async_trait;
use infradoc_core::{
    Attachment, CollectionPayload, DocumentRequest, InfrastructureSnapshot, OptionId, OptionNode,
};
use serde::{Deserialize, Serialize};

/// Shown while the server has not reported a total yet
pub const PLACEHOLDER_PERCENT: u8 = 5;

/// Inventory service abstraction
///
/// Everything that talks to the cloud lives behind this trait. Option lists
/// come back already normalized to [`OptionNode`]s.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Flat list of subscribed regions
    async fn list_regions(&self) -> Result<Vec<OptionNode>>;

    /// Compartments of the tenancy, pre-ordered and depth-annotated
    async fn list_compartments(&self, region: &OptionId) -> Result<Vec<OptionNode>>;

    /// Instances of one compartment
    async fn list_instances(
        &self,
        region: &OptionId,
        compartment_id: &OptionId,
    ) -> Result<Vec<OptionNode>>;

    /// Start a collection task
    async fn submit_collection(&self, payload: &CollectionPayload) -> Result<TaskHandle>;

    /// Current status of a collection task
    async fn poll_status(&self, task_id: &str) -> Result<TaskStatusResponse>;

    /// Render a document; returns the document bytes
    async fn export_document(
        &self,
        request: &DocumentRequest,
        attachments: &[Attachment],
    ) -> Result<Vec<u8>>;
}

/// Server-side handle of an accepted collection task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Task state as reported by the server.
///
/// States outside these four (`STARTED`, `RETRY`, ...) read as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Progress,
    Success,
    Failure,
    #[serde(other)]
    Pending,
}

/// Progress counters of a running task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub current: u32,
    pub total: u32,
    #[serde(rename = "step", default)]
    pub step_label: String,
}

impl ProgressInfo {
    pub fn new(current: u32, total: u32, step_label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            step_label: step_label.into(),
        }
    }

    /// Completion in percent, rounded and capped at 100
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return PLACEHOLDER_PERCENT;
        }
        let percent = (f64::from(self.current) / f64::from(self.total) * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

/// One status report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskState,
    #[serde(default)]
    pub progress: Option<ProgressInfo>,
    #[serde(default)]
    pub result: Option<InfrastructureSnapshot>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    pub fn pending() -> Self {
        Self {
            status: TaskState::Pending,
            progress: None,
            result: None,
            error: None,
        }
    }

    pub fn progress(current: u32, total: u32, step_label: impl Into<String>) -> Self {
        Self {
            status: TaskState::Progress,
            progress: Some(ProgressInfo::new(current, total, step_label)),
            result: None,
            error: None,
        }
    }

    pub fn success(result: InfrastructureSnapshot) -> Self {
        Self {
            status: TaskState::Success,
            progress: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: TaskState::Failure,
            progress: None,
            result: None,
            error: Some(error.into()),
        }
    }
}
