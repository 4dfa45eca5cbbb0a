//! Polling worker for the backfill job.
//!
//! Shutdown: [`BackfillWorker::shutdown`] stops the polling loop. A run that
//! is already in progress finishes its current attachment loop first.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::backfill::{BackfillRunner, RunReport};
use crate::scheduler::JobScheduler;

pub struct BackfillWorker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl BackfillWorker {
    /// Spawn the polling loop.
    pub fn start(runner: Arc<BackfillRunner>, scheduler: Arc<dyn JobScheduler>) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(Self::poll_loop(runner, scheduler, shutdown_rx));
        Self {
            shutdown_tx,
            handle,
        }
    }

    async fn poll_loop(
        runner: Arc<BackfillRunner>,
        scheduler: Arc<dyn JobScheduler>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let poll_interval: Duration = runner.config().poll_interval;
        tracing::info!(
            hook = %runner.config().hook_name,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Backfill worker started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Backfill worker shutting down");
                    break;
                }
                _ = sleep(poll_interval) => {
                    if let Err(e) = Self::run_due(&runner, scheduler.as_ref()).await {
                        tracing::error!(error = %e, "Backfill run failed");
                    }
                }
            }
        }

        tracing::info!("Backfill worker stopped");
    }

    /// Run the backfill if its job is due. Returns `None` when nothing was due.
    pub async fn run_due(
        runner: &BackfillRunner,
        scheduler: &dyn JobScheduler,
    ) -> Result<Option<RunReport>> {
        let hook = runner.config().hook_name.as_str();
        let Some(at) = scheduler.take_due(hook, Utc::now()).await? else {
            tracing::trace!(hook = %hook, "No backfill job due");
            return Ok(None);
        };

        tracing::debug!(hook = %hook, scheduled_at = %at, "Running due backfill job");
        runner.run().await.map(Some)
    }

    /// Stop polling and wait for the loop to exit.
    pub async fn shutdown(self) {
        tracing::info!("Initiating backfill worker shutdown");
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Backfill worker task panicked");
        }
    }
}
