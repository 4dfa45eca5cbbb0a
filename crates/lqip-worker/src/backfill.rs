//! Time-boxed backfill run.
//!
//! A run re-queries the repository for a batch of attachments still missing a
//! placeholder, processes them one by one and persists the result, until a
//! batch comes back empty. The id of the last attempted attachment is kept
//! across continuations, so attachments that keep failing are not picked up
//! again until the pool is exhausted. After every attachment the elapsed time
//! is compared to the budget; once it is reached a single continuation is
//! scheduled and the run returns.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use lqip_core::{Attachment, AttachmentId, AttachmentMetadata, BackfillConfig};
use lqip_db::{AttachmentRepository, MissingPlaceholderQuery};
use lqip_services::MetadataHooks;

use crate::scheduler::{JobError, JobScheduler};

/// Turns an attachment's stored metadata into metadata with placeholders.
#[async_trait]
pub trait AttachmentProcessor: Send + Sync {
    async fn process(&self, attachment: &Attachment) -> AttachmentMetadata;
}

#[async_trait]
impl AttachmentProcessor for MetadataHooks {
    async fn process(&self, attachment: &Attachment) -> AttachmentMetadata {
        self.process_images(attachment.metadata.clone(), attachment.id)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillState {
    Idle,
    Running,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// An empty batch was fetched. Nothing is scheduled.
    Exhausted,
    /// The budget ran out. `scheduled` is false when a run was already pending
    /// at `next_run`.
    Checkpointed {
        next_run: DateTime<Utc>,
        scheduled: bool,
    },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub processed: usize,
    pub batches: usize,
    pub elapsed: Duration,
}

pub struct BackfillRunner {
    repository: Arc<dyn AttachmentRepository>,
    processor: Arc<dyn AttachmentProcessor>,
    scheduler: Arc<dyn JobScheduler>,
    config: BackfillConfig,
    state: RwLock<BackfillState>,
    cursor: RwLock<Option<AttachmentId>>,
}

impl BackfillRunner {
    pub fn new(
        repository: Arc<dyn AttachmentRepository>,
        processor: Arc<dyn AttachmentProcessor>,
        scheduler: Arc<dyn JobScheduler>,
        config: BackfillConfig,
    ) -> Self {
        Self {
            repository,
            processor,
            scheduler,
            config,
            state: RwLock::new(BackfillState::Idle),
            cursor: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    pub async fn state(&self) -> BackfillState {
        *self.state.read().await
    }

    /// Last attachment attempted by an unfinished sweep.
    pub async fn cursor(&self) -> Option<AttachmentId> {
        *self.cursor.read().await
    }

    async fn set_state(&self, state: BackfillState) {
        *self.state.write().await = state;
    }

    /// Execute one run. Repository and scheduler failures end the run and are
    /// returned; per-attachment processing never fails.
    #[tracing::instrument(skip(self), fields(hook = %self.config.hook_name))]
    pub async fn run(&self) -> Result<RunReport> {
        self.set_state(BackfillState::Running).await;
        let result = self.run_batches().await;
        if result.is_err() {
            self.set_state(BackfillState::Idle).await;
        }
        result
    }

    async fn run_batches(&self) -> Result<RunReport> {
        let start = Instant::now();
        let budget = self.config.budget();

        match self
            .repository
            .count_missing_placeholder(&self.config.allowed_mime_types)
            .await
        {
            Ok(remaining) => tracing::info!(
                remaining,
                batch_size = self.config.batch_size,
                budget_ms = budget.as_millis() as u64,
                "Backfill run started"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not count attachments missing a placeholder"),
        }

        let mut cursor = *self.cursor.read().await;
        let mut processed = 0usize;
        let mut batches = 0usize;

        loop {
            let mut query = MissingPlaceholderQuery::new(
                self.config.allowed_mime_types.clone(),
                self.config.batch_size,
            );
            query.after = cursor;

            let batch = self
                .repository
                .find_missing_placeholder(&query)
                .await
                .context("Failed to fetch backfill batch")?;

            if batch.is_empty() {
                *self.cursor.write().await = None;
                self.set_state(BackfillState::Exhausted).await;
                tracing::info!(
                    processed,
                    batches,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Backfill exhausted"
                );
                return Ok(RunReport {
                    outcome: RunOutcome::Exhausted,
                    processed,
                    batches,
                    elapsed: start.elapsed(),
                });
            }

            batches += 1;
            tracing::debug!(batch = batches, size = batch.len(), "Backfill batch fetched");

            for attachment in batch {
                let metadata = self.processor.process(&attachment).await;
                if let Err(e) = self
                    .repository
                    .update_metadata(attachment.id, metadata)
                    .await
                {
                    tracing::warn!(
                        attachment_id = %attachment.id,
                        error = %e,
                        "Failed to persist attachment metadata"
                    );
                }
                cursor = Some(attachment.id);
                *self.cursor.write().await = cursor;
                processed += 1;

                let elapsed = start.elapsed();
                if elapsed >= budget {
                    let (next_run, scheduled) = self.schedule_continuation().await?;
                    self.set_state(BackfillState::Idle).await;
                    tracing::info!(
                        processed,
                        batches,
                        elapsed_ms = elapsed.as_millis() as u64,
                        next_run = %next_run,
                        scheduled,
                        "Backfill budget reached, checkpointing"
                    );
                    return Ok(RunReport {
                        outcome: RunOutcome::Checkpointed {
                            next_run,
                            scheduled,
                        },
                        processed,
                        batches,
                        elapsed,
                    });
                }
            }
        }
    }

    /// Schedule the continuation unless a run is already pending.
    async fn schedule_continuation(&self) -> Result<(DateTime<Utc>, bool), JobError> {
        let hook = self.config.hook_name.as_str();
        if let Some(pending) = self.scheduler.next_scheduled(hook).await? {
            return Ok((pending, false));
        }

        let delay = chrono::Duration::from_std(self.config.continuation_delay)
            .map_err(|e| JobError::InvalidSchedule(e.to_string()))?;
        let at = Utc::now() + delay;
        self.scheduler.schedule_single(at, hook).await?;
        Ok((at, true))
    }
}
