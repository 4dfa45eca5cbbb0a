//! In-memory attachment repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use lqip_core::{AppError, Attachment, AttachmentId, AttachmentMetadata};

use super::attachment::{AttachmentRepository, MissingPlaceholderQuery};

/// Attachment store held in process memory. Reads observe every completed write.
#[derive(Clone, Default)]
pub struct InMemoryAttachmentRepository {
    attachments: Arc<RwLock<BTreeMap<AttachmentId, Attachment>>>,
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachments(attachments: impl IntoIterator<Item = Attachment>) -> Self {
        let map = attachments.into_iter().map(|a| (a.id, a)).collect();
        Self {
            attachments: Arc::new(RwLock::new(map)),
        }
    }

    /// Snapshot of every stored attachment in id order.
    pub async fn all(&self) -> Vec<Attachment> {
        self.attachments.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AppError> {
        Ok(self.attachments.read().await.get(&id).cloned())
    }

    async fn find_missing_placeholder(
        &self,
        query: &MissingPlaceholderQuery,
    ) -> Result<Vec<Attachment>, AppError> {
        let attachments = self.attachments.read().await;
        Ok(attachments
            .values()
            .filter(|a| query.matches(a))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn count_missing_placeholder(&self, mime_types: &[String]) -> Result<usize, AppError> {
        let query = MissingPlaceholderQuery::new(mime_types.to_vec(), usize::MAX);
        let attachments = self.attachments.read().await;
        Ok(attachments.values().filter(|a| query.matches(a)).count())
    }

    async fn update_metadata(
        &self,
        id: AttachmentId,
        metadata: AttachmentMetadata,
    ) -> Result<(), AppError> {
        let mut attachments = self.attachments.write().await;
        let attachment = attachments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;
        attachment.metadata = metadata;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lqip_core::constants::FULL_SIZE;
    use lqip_core::SizeMetadata;

    fn attachment(id: u64, mime: &str) -> Attachment {
        Attachment {
            id: AttachmentId(id),
            mime_type: mime.to_string(),
            metadata: AttachmentMetadata::new(format!("2024/{id}.jpg"), 100, 50),
        }
    }

    fn completed(mut metadata: AttachmentMetadata) -> AttachmentMetadata {
        let mut full = SizeMetadata::new(metadata.file_name().to_string(), 100, 50, "image/jpeg");
        full.base64 = Some("AAAA".to_string());
        metadata.sizes.insert(FULL_SIZE.to_string(), full);
        metadata
    }

    #[tokio::test]
    async fn find_respects_limit_and_order() {
        let repo = InMemoryAttachmentRepository::with_attachments(
            (1..=5).rev().map(|id| attachment(id, "image/jpeg")),
        );
        let query = MissingPlaceholderQuery::new(vec!["image/jpeg".to_string()], 3);
        let ids: Vec<u64> = repo
            .find_missing_placeholder(&query)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn update_is_visible_to_next_query() {
        let repo = InMemoryAttachmentRepository::with_attachments(vec![
            attachment(1, "image/jpeg"),
            attachment(2, "image/jpeg"),
            attachment(3, "application/pdf"),
        ]);
        let mimes = vec!["image/jpeg".to_string()];
        assert_eq!(repo.count_missing_placeholder(&mimes).await.unwrap(), 2);

        let stored = repo.get(AttachmentId(1)).await.unwrap().unwrap();
        repo.update_metadata(AttachmentId(1), completed(stored.metadata))
            .await
            .unwrap();

        assert_eq!(repo.count_missing_placeholder(&mimes).await.unwrap(), 1);
        let query = MissingPlaceholderQuery::new(mimes, 10);
        let remaining = repo.find_missing_placeholder(&query).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, AttachmentId(2));
    }

    #[tokio::test]
    async fn update_unknown_attachment_fails() {
        let repo = InMemoryAttachmentRepository::new();
        let err = repo
            .update_metadata(AttachmentId(9), AttachmentMetadata::new("x.jpg", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
