//! Attachment repository contract.

use async_trait::async_trait;
use lqip_core::{AppError, Attachment, AttachmentId, AttachmentMetadata};

/// Selection of attachments that still lack a placeholder.
#[derive(Debug, Clone, Default)]
pub struct MissingPlaceholderQuery {
    /// Only attachments with one of these MIME types qualify.
    pub mime_types: Vec<String>,
    /// Maximum number of attachments to return.
    pub limit: usize,
    /// Only attachments with an id strictly greater than this qualify.
    pub after: Option<AttachmentId>,
}

impl MissingPlaceholderQuery {
    pub fn new(mime_types: Vec<String>, limit: usize) -> Self {
        Self {
            mime_types,
            limit,
            after: None,
        }
    }

    /// Whether `attachment` satisfies the query, ignoring the limit.
    pub fn matches(&self, attachment: &Attachment) -> bool {
        self.mime_types.iter().any(|m| m == &attachment.mime_type)
            && self.after.map_or(true, |after| attachment.id > after)
            && attachment.metadata.is_missing_placeholder()
    }
}

/// Read and write access to attachment metadata.
///
/// Writes are expected to be visible to the next
/// [`find_missing_placeholder`](AttachmentRepository::find_missing_placeholder)
/// call made by the same process.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Fetch one attachment.
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AppError>;

    /// Attachments matching `query`, in ascending id order.
    async fn find_missing_placeholder(
        &self,
        query: &MissingPlaceholderQuery,
    ) -> Result<Vec<Attachment>, AppError>;

    /// Number of attachments of the given types still missing a placeholder.
    async fn count_missing_placeholder(&self, mime_types: &[String]) -> Result<usize, AppError>;

    /// Replace the stored metadata of an attachment.
    async fn update_metadata(
        &self,
        id: AttachmentId,
        metadata: AttachmentMetadata,
    ) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(id: u64, mime: &str) -> Attachment {
        Attachment {
            id: AttachmentId(id),
            mime_type: mime.to_string(),
            metadata: AttachmentMetadata::new(format!("{id}.jpg"), 10, 10),
        }
    }

    #[test]
    fn query_filters_on_mime_and_cursor() {
        let mut query = MissingPlaceholderQuery::new(vec!["image/jpeg".to_string()], 10);
        assert!(query.matches(&attachment(1, "image/jpeg")));
        assert!(!query.matches(&attachment(2, "application/pdf")));

        query.after = Some(AttachmentId(1));
        assert!(!query.matches(&attachment(1, "image/jpeg")));
        assert!(query.matches(&attachment(2, "image/jpeg")));
    }
}
