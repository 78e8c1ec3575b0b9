//! Collection task client
//!
//! Submits a collection request and follows the task until it settles.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──accepted──▶ Pending ⇄ Progress
//!   ▲                  │                        │
//!   └──── rejected ────┘                        ├──▶ Success
//!                                               ├──▶ Failure
//!                                               ├──▶ TransportError
//!                                               └──▶ Detached (transport error after 100%)
//! ```
//!
//! While a task is live two periodic workers run: a status poller and an
//! elapsed-time ticker. Both watch the same [`CancellationToken`], so any stop
//! (terminal status, transport error, reset) ends both of them.

use crate::backend::{InventoryBackend, ProgressInfo, TaskState, TaskStatusResponse};
use crate::error::{CloudError, Result};
use crate::events::{EventSender, SessionEvent, emit};
use infradoc_core::{CollectionPayload, InfrastructureSnapshot};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lifecycle phase of the current collection task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskPhase {
    #[default]
    Idle,
    Submitting,
    Pending,
    Progress,
    Success,
    Failure,
    TransportError,
    /// Polling failed after completion was already reported; no result
    Detached,
}

impl TaskPhase {
    /// Whether a new submission must be refused
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            TaskPhase::Submitting | TaskPhase::Pending | TaskPhase::Progress
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskPhase::Success | TaskPhase::Failure | TaskPhase::TransportError | TaskPhase::Detached
        )
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::Idle => "idle",
            TaskPhase::Submitting => "submitting",
            TaskPhase::Pending => "pending",
            TaskPhase::Progress => "progress",
            TaskPhase::Success => "success",
            TaskPhase::Failure => "failure",
            TaskPhase::TransportError => "transport error",
            TaskPhase::Detached => "detached",
        };
        f.write_str(name)
    }
}

/// Observable state of the current task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskView {
    pub phase: TaskPhase,
    pub task_id: Option<String>,
    pub progress: Option<ProgressInfo>,
    /// Last displayed completion percentage
    pub percent: u8,
    pub elapsed: Duration,
    pub result: Option<InfrastructureSnapshot>,
    pub error: Option<String>,
}

/// One status check as seen by the poller
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Status(TaskStatusResponse),
    TransportFailure(String),
}

/// What the poller does after applying an outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollStep {
    pub event: Option<SessionEvent>,
    pub stop: bool,
}

impl TaskView {
    fn accepted(task_id: &str) -> Self {
        Self {
            phase: TaskPhase::Pending,
            task_id: Some(task_id.to_string()),
            ..Default::default()
        }
    }

    fn id(&self) -> String {
        self.task_id.clone().unwrap_or_default()
    }

    /// Apply one poll outcome. Outcomes arriving after a terminal phase are
    /// ignored.
    pub fn apply(&mut self, outcome: PollOutcome) -> PollStep {
        if !self.phase.is_live() {
            return PollStep {
                event: None,
                stop: true,
            };
        }

        match outcome {
            PollOutcome::Status(response) => self.apply_status(response),
            PollOutcome::TransportFailure(message) => {
                if self.percent >= 100 {
                    tracing::warn!(
                        "Ignoring poll error for task {} after completion: {}",
                        self.id(),
                        message
                    );
                    self.phase = TaskPhase::Detached;
                    return PollStep {
                        event: None,
                        stop: true,
                    };
                }
                tracing::warn!("Polling task {} failed: {}", self.id(), message);
                self.phase = TaskPhase::TransportError;
                self.error = Some(message.clone());
                PollStep {
                    event: Some(SessionEvent::NetworkError {
                        task_id: self.id(),
                        message,
                    }),
                    stop: true,
                }
            }
        }
    }

    fn apply_status(&mut self, response: TaskStatusResponse) -> PollStep {
        match response.status {
            TaskState::Pending => PollStep::default(),
            TaskState::Progress => {
                let progress = response.progress.unwrap_or_default();
                self.percent = progress.percent();
                self.phase = TaskPhase::Progress;
                let event = SessionEvent::TaskProgress {
                    percent: self.percent,
                    step: progress.step_label.clone(),
                };
                self.progress = Some(progress);
                PollStep {
                    event: Some(event),
                    stop: false,
                }
            }
            TaskState::Success => {
                self.phase = TaskPhase::Success;
                self.percent = 100;
                self.result = Some(response.result.unwrap_or_default());
                tracing::info!("Collection task {} succeeded", self.id());
                PollStep {
                    event: Some(SessionEvent::TaskSucceeded { task_id: self.id() }),
                    stop: true,
                }
            }
            TaskState::Failure => {
                let message = response
                    .error
                    .unwrap_or_else(|| "task reported failure".to_string());
                tracing::info!("Collection task {} failed: {}", self.id(), message);
                self.phase = TaskPhase::Failure;
                self.error = Some(message.clone());
                PollStep {
                    event: Some(SessionEvent::ServerFailure {
                        task_id: self.id(),
                        message,
                    }),
                    stop: true,
                }
            }
        }
    }
}

/// Poll and tick cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub tick_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Whether each periodic worker of the current task is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerState {
    pub poller: bool,
    pub ticker: bool,
}

struct Workers {
    token: CancellationToken,
    poller: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

pub struct CollectionTaskClient {
    backend: Arc<dyn InventoryBackend>,
    config: PollConfig,
    state: Arc<watch::Sender<TaskView>>,
    events: EventSender,
    workers: Option<Workers>,
}

impl CollectionTaskClient {
    pub fn new(backend: Arc<dyn InventoryBackend>, config: PollConfig, events: EventSender) -> Self {
        let (state, _) = watch::channel(TaskView::default());
        Self {
            backend,
            config,
            state: Arc::new(state),
            events,
            workers: None,
        }
    }

    pub fn view(&self) -> TaskView {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> TaskPhase {
        self.state.borrow().phase
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskView> {
        self.state.subscribe()
    }

    pub fn is_live(&self) -> bool {
        self.phase().is_live()
    }

    pub fn workers(&self) -> WorkerState {
        match &self.workers {
            Some(w) => WorkerState {
                poller: !w.poller.is_finished(),
                ticker: !w.ticker.is_finished(),
            },
            None => WorkerState {
                poller: false,
                ticker: false,
            },
        }
    }

    /// Submit a collection request and start following it.
    ///
    /// Refused while another task is live.
    pub async fn submit(&mut self, payload: CollectionPayload) -> Result<String> {
        if let Some(task_id) = self.live_task_id() {
            return Err(CloudError::TaskInFlight(task_id));
        }
        self.stop_workers();

        self.state.send_replace(TaskView {
            phase: TaskPhase::Submitting,
            ..Default::default()
        });
        tracing::info!(
            "Submitting {} collection for {} in {}",
            payload.kind,
            payload.compartment_id,
            payload.region
        );

        let handle = match self.backend.submit_collection(&payload).await {
            Ok(handle) => handle,
            Err(e) => {
                let message = match e {
                    CloudError::Submission(message) => message,
                    other => other.to_string(),
                };
                self.state.send_replace(TaskView {
                    error: Some(message.clone()),
                    ..Default::default()
                });
                emit(
                    &self.events,
                    SessionEvent::SubmissionFailed {
                        message: message.clone(),
                    },
                );
                return Err(CloudError::Submission(message));
            }
        };

        let task_id = handle.task_id;
        tracing::info!("Collection task {} accepted", task_id);
        self.state.send_replace(TaskView::accepted(&task_id));
        emit(
            &self.events,
            SessionEvent::TaskAccepted {
                task_id: task_id.clone(),
            },
        );
        self.start_workers(&task_id);
        Ok(task_id)
    }

    /// Stop tracking the current task and return to idle.
    ///
    /// Both periodic workers stop together. Returns the id of the task that
    /// was live, if any.
    pub fn cancel(&mut self) -> Option<String> {
        let live = self.live_task_id();
        self.stop_workers();
        self.state.send_replace(TaskView::default());
        if let Some(task_id) = &live {
            tracing::info!("Cancelled tracking of collection task {}", task_id);
            emit(
                &self.events,
                SessionEvent::TaskCancelled {
                    task_id: task_id.clone(),
                },
            );
        }
        live
    }

    /// Cancel and wait until both workers have exited
    pub async fn shutdown(&mut self) {
        self.cancel();
        if let Some(workers) = self.workers.take() {
            let _ = workers.poller.await;
            let _ = workers.ticker.await;
        }
    }

    /// Wait until the current task is no longer live
    pub async fn wait_settled(&self) -> TaskView {
        let mut rx = self.subscribe();
        match rx.wait_for(|view| !view.phase.is_live()).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        }
    }

    fn live_task_id(&self) -> Option<String> {
        let view = self.state.borrow();
        if view.phase.is_live() {
            Some(view.task_id.clone().unwrap_or_default())
        } else {
            None
        }
    }

    fn stop_workers(&mut self) {
        if let Some(workers) = &self.workers {
            workers.token.cancel();
        }
    }

    fn start_workers(&mut self, task_id: &str) {
        let token = CancellationToken::new();

        let poller = tokio::spawn(run_poller(
            Arc::clone(&self.backend),
            task_id.to_string(),
            self.config.poll_interval,
            token.clone(),
            Arc::clone(&self.state),
            self.events.clone(),
        ));
        let ticker = tokio::spawn(run_ticker(
            self.config.tick_interval,
            token.clone(),
            Arc::clone(&self.state),
        ));

        self.workers = Some(Workers {
            token,
            poller,
            ticker,
        });
    }
}

impl Drop for CollectionTaskClient {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

async fn run_poller(
    backend: Arc<dyn InventoryBackend>,
    task_id: String,
    period: Duration,
    token: CancellationToken,
    state: Arc<watch::Sender<TaskView>>,
    events: EventSender,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let outcome = tokio::select! {
            _ = token.cancelled() => break,
            response = backend.poll_status(&task_id) => match response {
                Ok(status) => PollOutcome::Status(status),
                Err(e) => PollOutcome::TransportFailure(e.to_string()),
            },
        };
        tracing::debug!("Poll of task {}: {}", task_id, poll_label(&outcome));

        let stop = commit(&state, &token, &events, outcome);
        if stop || token.is_cancelled() {
            token.cancel();
            break;
        }
    }
    tracing::debug!("Poller for task {} stopped", task_id);
}

/// Apply one poll outcome and emit its event while holding the state lock.
///
/// Nothing is applied or emitted once `token` is cancelled. Returns whether
/// polling should stop.
fn commit(
    state: &watch::Sender<TaskView>,
    token: &CancellationToken,
    events: &EventSender,
    outcome: PollOutcome,
) -> bool {
    let mut stop = false;
    state.send_modify(|view| {
        if token.is_cancelled() {
            return;
        }
        let step = view.apply(outcome);
        if let Some(event) = step.event {
            emit(events, event);
        }
        stop = step.stop;
    });
    stop
}

async fn run_ticker(period: Duration, token: CancellationToken, state: Arc<watch::Sender<TaskView>>) {
    let started = Instant::now();
    let mut interval = time::interval_at(started + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }
        let elapsed = started.elapsed();
        state.send_modify(|view| {
            if !token.is_cancelled() {
                view.elapsed = elapsed;
            }
        });
    }
}

fn poll_label(outcome: &PollOutcome) -> String {
    match outcome {
        PollOutcome::Status(response) => format!("{:?}", response.status),
        PollOutcome::TransportFailure(message) => format!("transport failure: {}", message),
    }
}
