pub mod collect;
pub mod export;
pub mod lang;
pub mod options;

use crate::ScopeArgs;
use crate::progress::TaskProgress;
use colored::Colorize;
use infradoc_cloud::{
    HttpBackend, HttpConfig, InventoryBackend, PollConfig, SessionController, SessionEvent,
};
use infradoc_config::Settings;
use std::sync::Arc;

pub fn connect(settings: &Settings) -> anyhow::Result<Arc<dyn InventoryBackend>> {
    let backend = HttpBackend::new(HttpConfig::new(
        settings.api_url.clone(),
        settings.request_timeout(),
    ))?;
    Ok(Arc::new(backend))
}

pub fn poll_config(settings: &Settings) -> PollConfig {
    PollConfig {
        poll_interval: settings.poll_interval(),
        tick_interval: settings.tick_interval(),
    }
}

/// Build the scope, run one collection task and resolve its snapshot
pub async fn run_collection(
    settings: &Settings,
    scope: &ScopeArgs,
) -> anyhow::Result<SessionController> {
    let (mut session, mut events) = SessionController::new(connect(settings)?, poll_config(settings));

    session.set_document_kind(scope.kind).await?;
    session.set_region(scope.region.as_str()).await?;
    session.set_compartment(scope.compartment.as_str()).await?;
    for instance in &scope.instances {
        if session.toggle_instance(instance.as_str()).is_none() {
            anyhow::bail!(
                "Instance {} is not running or stopped in compartment {}",
                instance,
                scope.compartment
            );
        }
    }

    let task_id = session.submit().await?;
    println!("{} {}", "Collection task started:".blue(), task_id.cyan());

    let progress = TaskProgress::new();
    let follower = tokio::spawn(progress.clone().follow(session.tasks().subscribe()));
    let outcome = session.wait_for_task().await.map(|_| ());
    let _ = follower.await;

    while let Ok(event) = events.try_recv() {
        tracing::debug!("Session event: {:?}", event);
        if let SessionEvent::ExportReady { ready: false } = event {
            progress.println(
                "Snapshot has no data for this document kind"
                    .yellow()
                    .to_string(),
            );
        }
    }

    match outcome {
        Ok(_) => {
            progress.finish_success();
            Ok(session)
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            session.shutdown().await;
            Err(e.into())
        }
    }
}
