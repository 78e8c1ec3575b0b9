//! Session controller
//!
//! Owns the one [`SessionContext`] of a session (scope, option lists,
//! resolved snapshot) and the [`CollectionTaskClient`]. Selection changes are
//! applied synchronously, then the affected levels are reloaded.

use crate::backend::InventoryBackend;
use crate::error::{CloudError, Result};
use crate::events::{self, EventReceiver, EventSender, SessionEvent, emit};
use crate::task::{CollectionTaskClient, PollConfig, TaskPhase, TaskView};
use chrono::Local;
use infradoc_core::{
    Attachment, DocumentKind, DocumentRequest, ExportMetadata, FilterResult, OptionId,
    OptionLevel, OptionNode, OptionTree, ReloadTicket, ScopeSelection, SelectionController,
    SelectionUpdate, ValidatedSnapshot, resolve, suggested_file_name,
};
use std::sync::Arc;

/// Mutable state of one session
#[derive(Debug, Default)]
pub struct SessionContext {
    pub selection: SelectionController,
    pub tree: OptionTree,
    /// Document kind of the last submission
    pub submitted_kind: Option<DocumentKind>,
    pub snapshot: Option<ValidatedSnapshot>,
}

/// What one level reload needs from the scope
#[derive(Debug, Clone, PartialEq, Eq)]
enum LevelRequest {
    Regions,
    Compartments {
        region: OptionId,
    },
    Instances {
        region: OptionId,
        compartment_id: OptionId,
    },
}

/// A reload that has been started but not completed
#[derive(Debug, Clone)]
pub struct PendingReload {
    ticket: ReloadTicket,
    request: LevelRequest,
}

impl PendingReload {
    pub fn level(&self) -> OptionLevel {
        self.ticket.level
    }
}

/// A rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct SessionController {
    backend: Arc<dyn InventoryBackend>,
    context: SessionContext,
    tasks: CollectionTaskClient,
    events: EventSender,
}

impl SessionController {
    /// Create a session; the receiver gets every notification
    pub fn new(backend: Arc<dyn InventoryBackend>, config: PollConfig) -> (Self, EventReceiver) {
        let (events, receiver) = events::channel();
        let tasks = CollectionTaskClient::new(Arc::clone(&backend), config, events.clone());
        let session = Self {
            backend,
            context: SessionContext::default(),
            tasks,
            events,
        };
        (session, receiver)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn scope(&self) -> &ScopeSelection {
        self.context.selection.scope()
    }

    pub fn options(&self, level: OptionLevel) -> &[OptionNode] {
        self.context.tree.flatten(level)
    }

    pub fn level_error(&self, level: OptionLevel) -> Option<&str> {
        self.context.tree.error(level)
    }

    pub fn filter(&self, level: OptionLevel, query: &str) -> FilterResult {
        self.context.tree.filter(level, query)
    }

    pub fn tasks(&self) -> &CollectionTaskClient {
        &self.tasks
    }

    pub fn task_view(&self) -> TaskView {
        self.tasks.view()
    }

    pub fn snapshot(&self) -> Option<&ValidatedSnapshot> {
        self.context.snapshot.as_ref()
    }

    /// The single gate for export
    pub fn export_ready(&self) -> bool {
        self.context
            .snapshot
            .as_ref()
            .map(|s| s.is_export_ready())
            .unwrap_or(false)
    }

    /// Submission is allowed: the scope is complete and no task is live
    pub fn can_submit(&self) -> bool {
        self.context.selection.is_submission_ready() && !self.tasks.is_live()
    }

    pub async fn load_regions(&mut self) -> Result<usize> {
        self.load_level(OptionLevel::Region).await
    }

    pub async fn set_region(&mut self, region: impl Into<OptionId>) -> Result<SelectionUpdate> {
        let update = self.context.selection.set_region(region);
        self.apply_update(update).await
    }

    pub async fn set_document_kind(&mut self, kind: DocumentKind) -> Result<SelectionUpdate> {
        let update = self.context.selection.set_document_kind(kind);
        self.apply_update(update).await
    }

    /// Pick a compartment from the loaded list; unknown ids keep the id as
    /// their name
    pub async fn set_compartment(
        &mut self,
        compartment_id: impl Into<OptionId>,
    ) -> Result<SelectionUpdate> {
        let compartment_id = compartment_id.into();
        let name = match self
            .context
            .tree
            .find(OptionLevel::Compartment, &compartment_id)
        {
            Some(node) => node.display_name.clone(),
            None => {
                tracing::warn!(
                    "Compartment {} is not in the loaded list",
                    compartment_id
                );
                compartment_id.to_string()
            }
        };
        let update = self.context.selection.set_compartment(compartment_id, name);
        self.apply_update(update).await
    }

    /// Toggle an instance of the loaded list.
    ///
    /// Returns `None` when the id is not offered.
    pub fn toggle_instance(&mut self, instance_id: impl Into<OptionId>) -> Option<bool> {
        let instance_id = instance_id.into();
        if self
            .context
            .tree
            .find(OptionLevel::Instance, &instance_id)
            .is_none()
        {
            tracing::warn!("Ignoring unknown instance {}", instance_id);
            return None;
        }
        let (selected, _) = self.context.selection.toggle_instance(instance_id);
        Some(selected)
    }

    /// Reload a level that failed, leaving the selection as it is
    pub async fn retry_level(&mut self, level: OptionLevel) -> Result<usize> {
        self.load_level(level).await
    }

    /// Reload one level for the current scope; returns the number of options
    pub async fn load_level(&mut self, level: OptionLevel) -> Result<usize> {
        let Some(pending) = self.begin_reload(level) else {
            return Ok(0);
        };
        let outcome = fetch(self.backend.as_ref(), &pending.request).await;
        self.finish_reload(pending, outcome)?;
        Ok(self.context.tree.flatten(level).len())
    }

    /// Start a reload of `level` for the current scope.
    ///
    /// Returns `None` when the scope does not reach that level yet; the level
    /// is left empty.
    pub fn begin_reload(&mut self, level: OptionLevel) -> Option<PendingReload> {
        let request = self.request_for(level)?;
        let ticket = self.context.tree.begin_reload(level);
        tracing::debug!("Reloading {} options", level);
        Some(PendingReload { ticket, request })
    }

    /// Fetch the options of a pending reload
    pub async fn fetch_reload(&self, pending: &PendingReload) -> Result<Vec<OptionNode>> {
        fetch(self.backend.as_ref(), &pending.request).await
    }

    /// Complete a reload; returns `Ok(false)` when it was superseded
    pub fn finish_reload(
        &mut self,
        pending: PendingReload,
        outcome: Result<Vec<OptionNode>>,
    ) -> Result<bool> {
        let level = pending.level();
        let outcome = outcome.map_err(|e| e.to_string());
        match self.context.tree.complete_reload(pending.ticket, outcome) {
            Ok(true) => {
                let count = self.context.tree.flatten(level).len();
                emit(&self.events, SessionEvent::LevelLoaded { level, count });
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                let err = CloudError::from(e);
                tracing::warn!("{}", err);
                emit(
                    &self.events,
                    SessionEvent::LevelFailed {
                        level,
                        message: self.context.tree.error(level).unwrap_or_default().to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    /// Submit the current scope as a collection task
    pub async fn submit(&mut self) -> Result<String> {
        if self.tasks.is_live() {
            let task_id = self.tasks.view().task_id.unwrap_or_default();
            return Err(CloudError::TaskInFlight(task_id));
        }
        let payload = self.context.selection.scope().payload()?;
        let kind = payload.kind;

        self.context.snapshot = None;
        self.context.submitted_kind = Some(kind);
        self.tasks.submit(payload).await
    }

    /// Wait for the live task to settle and resolve its snapshot
    pub async fn wait_for_task(&mut self) -> Result<&ValidatedSnapshot> {
        let view = self.tasks.wait_settled().await;
        match view.phase {
            TaskPhase::Success => {}
            TaskPhase::Failure => {
                return Err(CloudError::ServerTaskFailure(
                    view.error.unwrap_or_default(),
                ));
            }
            TaskPhase::TransportError => {
                return Err(CloudError::Transport(view.error.unwrap_or_default()));
            }
            TaskPhase::Detached => return Err(CloudError::NoSnapshot),
            _ => return Err(CloudError::Cancelled),
        }

        let raw = view.result.unwrap_or_default();
        let kind = self
            .context
            .submitted_kind
            .ok_or(CloudError::NoSnapshot)?;
        let validated = resolve(raw, kind)?;
        emit(
            &self.events,
            SessionEvent::ExportReady {
                ready: validated.is_export_ready(),
            },
        );
        Ok(self.context.snapshot.insert(validated))
    }

    /// Render the resolved snapshot into a document
    pub async fn export(
        &self,
        metadata: &ExportMetadata,
        attachments: &[Attachment],
    ) -> Result<ExportedDocument> {
        metadata.validate()?;
        let snapshot = self.context.snapshot.as_ref().ok_or(CloudError::NoSnapshot)?;
        let request = DocumentRequest::new(snapshot, metadata)?;

        tracing::info!(
            "Exporting {} document ({} attachments)",
            request.doc_type,
            attachments.len()
        );
        let bytes = self.backend.export_document(&request, attachments).await?;
        let file_name = suggested_file_name(
            request.doc_type,
            &snapshot.client_name(),
            Local::now().naive_local(),
        );
        Ok(ExportedDocument { file_name, bytes })
    }

    /// Drop the scope, the snapshot and any live task
    pub fn reset(&mut self) -> SelectionUpdate {
        self.tasks.cancel();
        let update = self.context.selection.reset();
        for level in &update.invalidated {
            self.context.tree.invalidate(*level);
        }
        self.context.snapshot = None;
        self.context.submitted_kind = None;
        tracing::info!("Session reset");
        update
    }

    /// Stop background work before dropping the session
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }

    async fn apply_update(&mut self, update: SelectionUpdate) -> Result<SelectionUpdate> {
        if update.is_noop() {
            return Ok(update);
        }
        for level in &update.invalidated {
            self.context.tree.invalidate(*level);
        }
        for level in &update.reload {
            self.load_level(*level).await?;
        }
        Ok(update)
    }

    fn request_for(&self, level: OptionLevel) -> Option<LevelRequest> {
        let scope = self.context.selection.scope();
        match level {
            OptionLevel::Region => Some(LevelRequest::Regions),
            OptionLevel::Compartment => Some(LevelRequest::Compartments {
                region: scope.region.clone()?,
            }),
            OptionLevel::Instance => {
                if !scope.document_kind.map(|k| k.uses_instances()).unwrap_or(false) {
                    return None;
                }
                Some(LevelRequest::Instances {
                    region: scope.region.clone()?,
                    compartment_id: scope.compartment_id.clone()?,
                })
            }
        }
    }
}

async fn fetch(backend: &dyn InventoryBackend, request: &LevelRequest) -> Result<Vec<OptionNode>> {
    match request {
        LevelRequest::Regions => backend.list_regions().await,
        LevelRequest::Compartments { region } => backend.list_compartments(region).await,
        LevelRequest::Instances {
            region,
            compartment_id,
        } => backend.list_instances(region, compartment_id).await,
    }
}
