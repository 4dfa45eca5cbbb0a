//! Backfill of placeholders for media uploaded before they existed.
//!
//! [`BackfillRunner`] works through attachments still missing a placeholder
//! under a wall-clock budget and checkpoints by scheduling a continuation job.
//! [`BackfillWorker`] polls a [`JobScheduler`] and runs due jobs.

pub mod backfill;
pub mod lifecycle;
pub mod scheduler;
pub mod worker;

pub use backfill::{AttachmentProcessor, BackfillRunner, BackfillState, RunOutcome, RunReport};
pub use lifecycle::{activate, deactivate};
pub use scheduler::{InMemoryJobScheduler, JobError, JobScheduler};
pub use worker::BackfillWorker;
