use indicatif::{ProgressBar, ProgressStyle};
use infradoc_cloud::TaskView;
use std::time::Duration;
use tokio::sync::watch;

/// Progress bar for a live collection task
#[derive(Clone)]
pub struct TaskProgress {
    progress_bar: ProgressBar,
}

impl Default for TaskProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{prefix}] [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_prefix(format_elapsed(Duration::ZERO));
        pb.set_message("Waiting for the collector...");

        Self { progress_bar: pb }
    }

    /// Mirror task state until the task is no longer live
    pub async fn follow(self, mut rx: watch::Receiver<TaskView>) {
        loop {
            let live = {
                let view = rx.borrow_and_update();
                self.update(&view);
                view.phase.is_live()
            };
            if !live || rx.changed().await.is_err() {
                break;
            }
        }
    }

    fn update(&self, view: &TaskView) {
        self.progress_bar.set_prefix(format_elapsed(view.elapsed));
        self.progress_bar.set_position(u64::from(view.percent));
        if let Some(progress) = &view.progress {
            if !progress.step_label.is_empty() {
                self.progress_bar.set_message(progress.step_label.clone());
            }
        }
        self.progress_bar.tick();
    }

    pub fn println(&self, message: String) {
        self.progress_bar.println(message);
    }

    pub fn finish_success(&self) {
        self.progress_bar.set_position(100);
        self.progress_bar
            .finish_with_message("Collection completed ✓");
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .abandon_with_message(format!("Collection failed: {}", error));
    }
}

/// Task elapsed time as `HH:MM:SS`
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(7_900)), "00:00:07");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01:02:05");
    }

    #[test]
    fn test_update_shows_task_elapsed() {
        let progress = TaskProgress::new();
        let view = TaskView {
            percent: 40,
            elapsed: Duration::from_secs(65),
            ..Default::default()
        };
        progress.update(&view);

        assert_eq!(progress.progress_bar.prefix(), "00:01:05");
        assert_eq!(progress.progress_bar.position(), 40);
    }
}
