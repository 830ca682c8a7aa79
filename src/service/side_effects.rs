//! Fire-and-forget side effects
//!
//! Tasks are spawned detached from the request that triggered them; their
//! outcomes travel over a channel to an observer that logs them. Nothing
//! here can fail the caller.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::metrics::SIDE_EFFECTS_TOTAL;

/// Outcome of one detached task
#[derive(Debug)]
pub struct SideEffectReport {
    pub task: &'static str,
    pub result: Result<(), AppError>,
}

/// Handle used by services to launch detached tasks
#[derive(Clone)]
pub struct SideEffects {
    reports: mpsc::UnboundedSender<SideEffectReport>,
}

impl SideEffects {
    /// Create a spawner and the receiving end of its report channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SideEffectReport>) {
        let (reports, receiver) = mpsc::unbounded_channel();
        (Self { reports }, receiver)
    }

    /// Create a spawner whose reports are logged by a background observer
    pub fn start() -> (Self, JoinHandle<()>) {
        let (side_effects, receiver) = Self::channel();
        let observer = tokio::spawn(observe(receiver));
        (side_effects, observer)
    }

    /// Launch `future` without awaiting it
    pub fn spawn<F>(&self, task: &'static str, future: F)
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let result = future.await;
            if let Err(report) = reports.send(SideEffectReport { task, result }) {
                // Observer gone (shutdown); log inline instead
                log_report(&report.0);
            }
        });
    }
}

/// Log every report until all spawners are dropped
pub async fn observe(mut receiver: mpsc::UnboundedReceiver<SideEffectReport>) {
    while let Some(report) = receiver.recv().await {
        log_report(&report);
    }
    tracing::debug!("Side effect observer stopped");
}

fn log_report(report: &SideEffectReport) {
    match &report.result {
        Ok(()) => {
            SIDE_EFFECTS_TOTAL
                .with_label_values(&[report.task, "ok"])
                .inc();
            tracing::debug!(task = report.task, "Side effect completed");
        }
        Err(error) => {
            SIDE_EFFECTS_TOTAL
                .with_label_values(&[report.task, "error"])
                .inc();
            tracing::error!(task = report.task, %error, "Side effect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_reach_the_channel() {
        let (side_effects, mut receiver) = SideEffects::channel();

        side_effects.spawn("ok_task", async { Ok(()) });
        side_effects.spawn("failing_task", async {
            Err(AppError::Storage("disk full".to_string()))
        });

        let mut reports = vec![
            receiver.recv().await.unwrap(),
            receiver.recv().await.unwrap(),
        ];
        reports.sort_by_key(|report| report.task);

        assert_eq!(reports[0].task, "failing_task");
        assert!(matches!(&reports[0].result, Err(AppError::Storage(message)) if message == "disk full"));
        assert_eq!(reports[1].task, "ok_task");
        assert!(reports[1].result.is_ok());
    }

    #[tokio::test]
    async fn observer_stops_when_spawners_are_dropped() {
        let (side_effects, observer) = SideEffects::start();
        side_effects.spawn("noop", async { Ok(()) });
        drop(side_effects);

        tokio::time::timeout(std::time::Duration::from_secs(5), observer)
            .await
            .expect("observer should stop")
            .unwrap();
    }
}
