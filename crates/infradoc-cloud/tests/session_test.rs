use async_trait::async_trait;
use infradoc_cloud::{
    CloudError, InventoryBackend, PollConfig, SessionController, SessionEvent, TaskHandle,
    TaskPhase, TaskStatusResponse,
};
use infradoc_core::{
    Attachment, AttachmentKind, CollectionPayload, DocumentKind, DocumentRequest, ExportMetadata,
    InfrastructureSnapshot, Language, OptionId, OptionKind, OptionLevel, OptionNode,
    ValidationError,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

type PollScript = Result<TaskStatusResponse, String>;

/// Backend that replays scripted poll responses and records calls
#[derive(Default)]
struct FakeBackend {
    polls: Mutex<VecDeque<PollScript>>,
    fail_compartments: AtomicBool,
    submit_error: Mutex<Option<String>>,
    submissions: AtomicUsize,
    poll_count: AtomicUsize,
    exports: Mutex<Vec<DocumentRequest>>,
}

impl FakeBackend {
    fn with_polls(polls: Vec<PollScript>) -> Arc<Self> {
        let backend = Self::default();
        *backend.polls.lock().unwrap() = polls.into();
        Arc::new(backend)
    }
}

#[async_trait]
impl InventoryBackend for FakeBackend {
    async fn list_regions(&self) -> infradoc_cloud::Result<Vec<OptionNode>> {
        Ok(vec![
            OptionNode::new("sa-saopaulo-1", "sa-saopaulo-1", OptionKind::Region)
                .with_detail("GRU"),
            OptionNode::new("us-ashburn-1", "us-ashburn-1", OptionKind::Region).with_detail("IAD"),
        ])
    }

    async fn list_compartments(&self, region: &OptionId) -> infradoc_cloud::Result<Vec<OptionNode>> {
        if self.fail_compartments.load(Ordering::SeqCst) {
            return Err(CloudError::Api {
                status: 500,
                message: "identity service unavailable".to_string(),
            });
        }
        let node = |id: &str, name: &str, depth: u32| {
            OptionNode::new(format!("{region}-{id}"), name, OptionKind::Compartment).at_depth(depth)
        };
        Ok(vec![
            node("a", "Alpha", 0),
            node("b", "SERVERS-ACME", 0),
            node("b1", "Payments", 1),
            node("b2", "Ledger", 1),
            node("c", "Charlie", 0),
        ])
    }

    async fn list_instances(
        &self,
        _region: &OptionId,
        _compartment_id: &OptionId,
    ) -> infradoc_cloud::Result<Vec<OptionNode>> {
        Ok(vec![
            OptionNode::new("i1", "web01", OptionKind::Instance).with_detail("RUNNING"),
            OptionNode::new("i2", "web02", OptionKind::Instance).with_detail("STOPPED"),
        ])
    }

    async fn submit_collection(
        &self,
        _payload: &CollectionPayload,
    ) -> infradoc_cloud::Result<TaskHandle> {
        if let Some(message) = self.submit_error.lock().unwrap().clone() {
            return Err(CloudError::Submission(message));
        }
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TaskHandle {
            task_id: format!("task-{n}"),
        })
    }

    async fn poll_status(&self, _task_id: &str) -> infradoc_cloud::Result<TaskStatusResponse> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        match self.polls.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(CloudError::Api {
                status: 502,
                message,
            }),
            None => Ok(TaskStatusResponse::pending()),
        }
    }

    async fn export_document(
        &self,
        request: &DocumentRequest,
        attachments: &[Attachment],
    ) -> infradoc_cloud::Result<Vec<u8>> {
        self.exports.lock().unwrap().push(request.clone());
        Ok(format!("docx:{}", attachments.len()).into_bytes())
    }
}

fn snapshot_with_instance() -> InfrastructureSnapshot {
    serde_json::from_value(serde_json::json!({
        "instances": [{
            "host_name": "web01",
            "lifecycle_state": "RUNNING",
            "shape": "VM.Standard.E4.Flex",
            "ocpus": "2",
            "memory": "16",
            "os_name": "Oracle Linux 8",
            "boot_volume_gb": "50",
            "private_ip": "10.0.0.10",
            "backup_policy_name": "Gold",
            "compartment_name": "SERVERS-ACME"
        }]
    }))
    .unwrap()
}

fn drain(events: &mut infradoc_cloud::EventReceiver) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

async fn new_host_scope(session: &mut SessionController) {
    session.set_document_kind(DocumentKind::NewHost).await.unwrap();
    session.set_region("sa-saopaulo-1").await.unwrap();
    session
        .set_compartment("sa-saopaulo-1-b")
        .await
        .unwrap();
    assert_eq!(session.toggle_instance("i1"), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_compartment_filter_keeps_parent() {
    let backend = FakeBackend::with_polls(vec![]);
    let (mut session, _events) = SessionController::new(backend, PollConfig::default());

    session.load_regions().await.unwrap();
    session.set_region("sa-saopaulo-1").await.unwrap();
    assert_eq!(session.options(OptionLevel::Compartment).len(), 5);

    let result = session.filter(OptionLevel::Compartment, "pay");
    let visible: Vec<String> = result
        .visible_ids()
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(visible, vec!["sa-saopaulo-1-b", "sa-saopaulo-1-b1"]);
}

#[tokio::test(start_paused = true)]
async fn test_region_change_reloads_compartments_and_clears_instances() {
    let backend = FakeBackend::with_polls(vec![]);
    let (mut session, _events) = SessionController::new(backend, PollConfig::default());
    new_host_scope(&mut session).await;
    assert_eq!(session.options(OptionLevel::Instance).len(), 2);

    session.set_region("us-ashburn-1").await.unwrap();
    assert!(session.scope().compartment_id.is_none());
    assert!(session.scope().instance_ids.is_empty());
    assert!(session.options(OptionLevel::Instance).is_empty());
    assert_eq!(
        session.options(OptionLevel::Compartment)[0].id.as_str(),
        "us-ashburn-1-a"
    );
}

#[tokio::test(start_paused = true)]
async fn test_instance_toggle_and_export_gate() {
    let backend = FakeBackend::with_polls(vec![Ok(TaskStatusResponse::success(
        snapshot_with_instance(),
    ))]);
    let (mut session, _events) = SessionController::new(backend, PollConfig::default());
    new_host_scope(&mut session).await;

    assert_eq!(session.toggle_instance("i2"), Some(true));
    assert_eq!(session.toggle_instance("i1"), Some(false));
    assert_eq!(session.toggle_instance("i-unknown"), None);
    assert_eq!(session.scope().instance_ids.len(), 1);
    assert!(!session.export_ready());

    session.submit().await.unwrap();
    assert!(!session.export_ready());
    session.wait_for_task().await.unwrap();
    assert!(session.export_ready());
}

#[tokio::test(start_paused = true)]
async fn test_progress_then_success_stops_both_workers() {
    let backend = FakeBackend::with_polls(vec![
        Ok(TaskStatusResponse::progress(1, 4, "Instances")),
        Ok(TaskStatusResponse::progress(2, 4, "Networking")),
        Ok(TaskStatusResponse::progress(3, 4, "Volume groups")),
        Ok(TaskStatusResponse::success(snapshot_with_instance())),
    ]);
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;
    drain(&mut events);

    let task_id = session.submit().await.unwrap();
    assert_eq!(task_id, "task-1");
    let workers = session.tasks().workers();
    assert!(workers.poller && workers.ticker);

    let ready = session.wait_for_task().await.unwrap().is_export_ready();
    assert!(ready);
    settle().await;

    let workers = session.tasks().workers();
    assert!(!workers.poller);
    assert!(!workers.ticker);
    assert_eq!(session.task_view().phase, TaskPhase::Success);
    assert!(session.task_view().elapsed >= Duration::from_secs(7));
    assert_eq!(backend.poll_count.load(Ordering::SeqCst), 4);

    let percents: Vec<u8> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::TaskProgress { percent, .. } => Some(percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![25, 50, 75]);

    // no further polls once settled
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.poll_count.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_before_completion() {
    let backend = FakeBackend::with_polls(vec![
        Ok(TaskStatusResponse::progress(2, 5, "Networking")),
        Err("connection reset".to_string()),
    ]);
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;
    drain(&mut events);

    session.submit().await.unwrap();
    let err = session.wait_for_task().await.unwrap_err();
    assert!(matches!(err, CloudError::Transport(_)));
    settle().await;

    let view = session.task_view();
    assert_eq!(view.phase, TaskPhase::TransportError);
    assert_eq!(view.percent, 40);
    let workers = session.tasks().workers();
    assert!(!workers.poller && !workers.ticker);

    let network_errors = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::NetworkError { .. }))
        .count();
    assert_eq!(network_errors, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.poll_count.load(Ordering::SeqCst), 2);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_after_completion_is_swallowed() {
    let backend = FakeBackend::with_polls(vec![
        Ok(TaskStatusResponse::progress(4, 4, "Finishing")),
        Err("connection reset".to_string()),
    ]);
    let (mut session, mut events) = SessionController::new(backend, PollConfig::default());
    new_host_scope(&mut session).await;

    session.submit().await.unwrap();
    let err = session.wait_for_task().await.unwrap_err();
    assert!(matches!(err, CloudError::NoSnapshot));
    assert_eq!(session.task_view().phase, TaskPhase::Detached);
    assert!(!drain(&mut events).iter().any(|e| e.is_error()));

    // admission is open again
    assert!(session.can_submit());
}

#[tokio::test(start_paused = true)]
async fn test_server_failure() {
    let backend = FakeBackend::with_polls(vec![Ok(TaskStatusResponse::failure(
        "compartment not authorized",
    ))]);
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;

    session.submit().await.unwrap();
    let err = session.wait_for_task().await.unwrap_err();
    assert!(matches!(err, CloudError::ServerTaskFailure(ref m) if m == "compartment not authorized"));
    settle().await;

    let workers = session.tasks().workers();
    assert!(!workers.poller);
    assert!(!workers.ticker);
    let polls = backend.poll_count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.poll_count.load(Ordering::SeqCst), polls);
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::ServerFailure { .. })));
    assert!(!session.export_ready());
    assert!(session.can_submit());
}

#[tokio::test(start_paused = true)]
async fn test_single_live_task() {
    let backend = FakeBackend::with_polls(vec![]);
    let (mut session, _events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;

    session.submit().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.tasks().is_live());
    assert!(!session.can_submit());

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, CloudError::TaskInFlight(ref id) if id == "task-1"));
    assert_eq!(backend.submissions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_poller_and_ticker_together() {
    let backend = FakeBackend::with_polls(vec![Ok(TaskStatusResponse::progress(1, 3, "Instances"))]);
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;

    session.submit().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    let workers = session.tasks().workers();
    assert!(workers.poller && workers.ticker);

    session.reset();
    settle().await;

    let workers = session.tasks().workers();
    assert!(!workers.poller);
    assert!(!workers.ticker);
    assert_eq!(session.task_view().phase, TaskPhase::Idle);
    assert!(session.scope().region.is_none());
    assert!(session.options(OptionLevel::Compartment).is_empty());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::TaskCancelled { task_id } if task_id == "task-1")));

    let polls = backend.poll_count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.poll_count.load(Ordering::SeqCst), polls);
}

#[tokio::test(start_paused = true)]
async fn test_submission_rejected_returns_to_idle() {
    let backend = FakeBackend::with_polls(vec![]);
    *backend.submit_error.lock().unwrap() = Some("queue full".to_string());
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, CloudError::Submission(ref m) if m == "queue full"));
    assert_eq!(session.task_view().phase, TaskPhase::Idle);
    assert!(session.can_submit());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::SubmissionFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_scope_is_rejected_locally() {
    let backend = FakeBackend::with_polls(vec![]);
    let (mut session, _events) = SessionController::new(backend.clone(), PollConfig::default());
    session.set_document_kind(DocumentKind::NewHost).await.unwrap();
    session.set_region("sa-saopaulo-1").await.unwrap();
    session.set_compartment("sa-saopaulo-1-b").await.unwrap();

    let err = session.submit().await.unwrap_err();
    assert!(matches!(
        err,
        CloudError::Validation(ValidationError::NoInstancesSelected)
    ));
    assert_eq!(backend.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_level_is_empty_and_retryable() {
    let backend = FakeBackend::with_polls(vec![]);
    backend.fail_compartments.store(true, Ordering::SeqCst);
    let (mut session, mut events) = SessionController::new(backend.clone(), PollConfig::default());

    let err = session.set_region("sa-saopaulo-1").await.unwrap_err();
    assert!(matches!(
        err,
        CloudError::ScopeLoad {
            level: OptionLevel::Compartment,
            ..
        }
    ));
    assert!(session.options(OptionLevel::Compartment).is_empty());
    assert!(session.level_error(OptionLevel::Compartment).is_some());
    assert_eq!(session.scope().region, Some("sa-saopaulo-1".into()));
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::LevelFailed { .. })));

    backend.fail_compartments.store(false, Ordering::SeqCst);
    let count = session.retry_level(OptionLevel::Compartment).await.unwrap();
    assert_eq!(count, 5);
    assert!(session.level_error(OptionLevel::Compartment).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_reload_is_discarded() {
    let backend = FakeBackend::with_polls(vec![]);
    let (mut session, _events) = SessionController::new(backend, PollConfig::default());
    session.set_region("sa-saopaulo-1").await.unwrap();

    let pending = session.begin_reload(OptionLevel::Compartment).unwrap();
    let stale = session.fetch_reload(&pending).await;

    session.set_region("us-ashburn-1").await.unwrap();
    let applied = session.finish_reload(pending, stale).unwrap();
    assert!(!applied);
    assert!(session
        .options(OptionLevel::Compartment)
        .iter()
        .all(|n| n.id.as_str().starts_with("us-ashburn-1")));
}

#[tokio::test(start_paused = true)]
async fn test_export_checks_responsible_before_calling_backend() {
    let backend = FakeBackend::with_polls(vec![Ok(TaskStatusResponse::success(
        snapshot_with_instance(),
    ))]);
    let (mut session, _events) = SessionController::new(backend.clone(), PollConfig::default());
    new_host_scope(&mut session).await;
    session.submit().await.unwrap();
    session.wait_for_task().await.unwrap();

    let err = session
        .export(&ExportMetadata::new("  ", Language::Pt), &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CloudError::Validation(ValidationError::BlankResponsible)
    ));
    assert!(backend.exports.lock().unwrap().is_empty());

    let attachments = vec![Attachment::new(
        AttachmentKind::Architecture,
        "diagram.png",
        vec![0x89, 0x50],
    )];
    let document = session
        .export(&ExportMetadata::new("Ana Souza", Language::En), &attachments)
        .await
        .unwrap();
    assert!(document.file_name.starts_with("Doc_NewHost_ACME_"));
    assert!(document.file_name.ends_with(".docx"));
    assert_eq!(document.bytes, b"docx:1".to_vec());

    let exports = backend.exports.lock().unwrap();
    assert_eq!(exports[0].responsible_name, "Ana Souza");
    assert_eq!(exports[0].lang, Language::En);
}

#[tokio::test(start_paused = true)]
async fn test_export_without_snapshot() {
    let backend = FakeBackend::with_polls(vec![]);
    let (session, _events) = SessionController::new(backend, PollConfig::default());
    let err = session
        .export(&ExportMetadata::new("Ana", Language::Pt), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::NoSnapshot));
}
