//! One-shot job scheduling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Scheduler backend error: {0}")]
    Backend(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

impl From<JobError> for lqip_core::AppError {
    fn from(err: JobError) -> Self {
        lqip_core::AppError::Internal(err.to_string())
    }
}

/// Named single events, the way the host's cron exposes them.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Earliest pending run of `hook`.
    async fn next_scheduled(&self, hook: &str) -> Result<Option<DateTime<Utc>>, JobError>;

    async fn schedule_single(&self, at: DateTime<Utc>, hook: &str) -> Result<(), JobError>;

    /// Remove the pending run of `hook` at `at`. Returns whether one was removed.
    async fn unschedule(&self, at: DateTime<Utc>, hook: &str) -> Result<bool, JobError>;

    /// Remove and return the earliest run of `hook` due at `now`.
    async fn take_due(
        &self,
        hook: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, JobError>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobScheduler {
    events: Mutex<HashMap<String, BTreeSet<DateTime<Utc>>>>,
}

impl InMemoryJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending runs of `hook`.
    pub async fn pending(&self, hook: &str) -> usize {
        self.events.lock().await.get(hook).map_or(0, BTreeSet::len)
    }
}

#[async_trait]
impl JobScheduler for InMemoryJobScheduler {
    async fn next_scheduled(&self, hook: &str) -> Result<Option<DateTime<Utc>>, JobError> {
        let events = self.events.lock().await;
        Ok(events.get(hook).and_then(|set| set.first().copied()))
    }

    async fn schedule_single(&self, at: DateTime<Utc>, hook: &str) -> Result<(), JobError> {
        self.events
            .lock()
            .await
            .entry(hook.to_string())
            .or_default()
            .insert(at);
        tracing::debug!(hook = %hook, at = %at, "Job scheduled");
        Ok(())
    }

    async fn unschedule(&self, at: DateTime<Utc>, hook: &str) -> Result<bool, JobError> {
        let mut events = self.events.lock().await;
        let removed = events.get_mut(hook).is_some_and(|set| set.remove(&at));
        Ok(removed)
    }

    async fn take_due(
        &self,
        hook: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, JobError> {
        let mut events = self.events.lock().await;
        let Some(set) = events.get_mut(hook) else {
            return Ok(None);
        };
        match set.first().copied() {
            Some(at) if at <= now => {
                set.remove(&at);
                Ok(Some(at))
            }
            _ => Ok(None),
        }
    }
}
