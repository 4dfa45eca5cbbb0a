//! Placeholder lookup for consumers of stored metadata.

use std::sync::Arc;

use lqip_core::constants::FULL_SIZE;
use lqip_core::{AppError, AttachmentId};
use lqip_db::AttachmentRepository;

/// Post-processes lookup results. Filters run in registration order, each
/// receiving the previous filter's output.
pub trait PlaceholderFilter: Send + Sync {
    fn filter(&self, value: Option<String>, attachment_id: AttachmentId, size: &str)
        -> Option<String>;
}

impl<F> PlaceholderFilter for F
where
    F: Fn(Option<String>, AttachmentId, &str) -> Option<String> + Send + Sync,
{
    fn filter(
        &self,
        value: Option<String>,
        attachment_id: AttachmentId,
        size: &str,
    ) -> Option<String> {
        self(value, attachment_id, size)
    }
}

#[derive(Clone)]
pub struct PlaceholderLookup {
    repository: Arc<dyn AttachmentRepository>,
    filters: Vec<Arc<dyn PlaceholderFilter>>,
}

impl PlaceholderLookup {
    pub fn new(repository: Arc<dyn AttachmentRepository>) -> Self {
        Self {
            repository,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl PlaceholderFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Stored placeholder for `size`, falling back to `full`.
    ///
    /// Returns `None` without running the filters when the attachment is
    /// unknown or not an image.
    pub async fn get_placeholder(
        &self,
        attachment_id: AttachmentId,
        size: &str,
    ) -> Result<Option<String>, AppError> {
        let Some(attachment) = self.repository.get(attachment_id).await? else {
            return Ok(None);
        };
        if !attachment.is_image() {
            return Ok(None);
        }

        let found = [size, FULL_SIZE].into_iter().find_map(|candidate| {
            attachment
                .metadata
                .sizes
                .get(candidate)
                .and_then(|entry| entry.base64.clone())
        });

        Ok(self
            .filters
            .iter()
            .fold(found, |value, f| f.filter(value, attachment_id, size)))
    }
}
