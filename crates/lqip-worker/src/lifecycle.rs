//! Activation and deactivation of the backfill job.

use chrono::Utc;

use crate::scheduler::{JobError, JobScheduler};

/// Schedule an immediate backfill unless one is already pending.
/// Returns whether a run was scheduled.
pub async fn activate(scheduler: &dyn JobScheduler, hook: &str) -> Result<bool, JobError> {
    if let Some(at) = scheduler.next_scheduled(hook).await? {
        tracing::debug!(hook = %hook, at = %at, "Backfill already pending");
        return Ok(false);
    }

    scheduler.schedule_single(Utc::now(), hook).await?;
    tracing::info!(hook = %hook, "Backfill scheduled on activation");
    Ok(true)
}

/// Cancel the pending backfill run, if any.
pub async fn deactivate(scheduler: &dyn JobScheduler, hook: &str) -> Result<bool, JobError> {
    let Some(at) = scheduler.next_scheduled(hook).await? else {
        return Ok(false);
    };

    let removed = scheduler.unschedule(at, hook).await?;
    tracing::info!(hook = %hook, at = %at, removed, "Backfill unscheduled on deactivation");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::InMemoryJobScheduler;

    const HOOK: &str = "image-base64_hook_process_media";

    #[tokio::test]
    async fn activation_is_idempotent() {
        let scheduler = InMemoryJobScheduler::new();
        assert!(activate(&scheduler, HOOK).await.unwrap());
        assert!(!activate(&scheduler, HOOK).await.unwrap());
        assert_eq!(scheduler.pending(HOOK).await, 1);
    }

    #[tokio::test]
    async fn deactivation_cancels_pending_run() {
        let scheduler = InMemoryJobScheduler::new();
        assert!(!deactivate(&scheduler, HOOK).await.unwrap());

        activate(&scheduler, HOOK).await.unwrap();
        assert!(deactivate(&scheduler, HOOK).await.unwrap());
        assert_eq!(scheduler.pending(HOOK).await, 0);
    }
}
