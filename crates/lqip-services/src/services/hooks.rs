//! Metadata hooks invoked by the host when attachment metadata is generated
//! or updated.

use std::sync::Arc;

use lqip_core::{AttachmentId, AttachmentMetadata};
use lqip_db::AttachmentRepository;

use super::placeholder::PlaceholderService;

/// Entry point shared by the upload hooks and the backfill.
#[derive(Clone)]
pub struct MetadataHooks {
    service: Arc<PlaceholderService>,
    repository: Arc<dyn AttachmentRepository>,
}

impl MetadataHooks {
    pub fn new(service: Arc<PlaceholderService>, repository: Arc<dyn AttachmentRepository>) -> Self {
        Self {
            service,
            repository,
        }
    }

    pub async fn on_generate_attachment_metadata(
        &self,
        metadata: AttachmentMetadata,
        id: AttachmentId,
    ) -> AttachmentMetadata {
        self.process_images(metadata, id).await
    }

    pub async fn on_update_attachment_metadata(
        &self,
        metadata: AttachmentMetadata,
        id: AttachmentId,
    ) -> AttachmentMetadata {
        self.process_images(metadata, id).await
    }

    /// Add placeholders to `metadata` when `id` is a known image attachment.
    /// Anything else returns `metadata` as it came in.
    pub async fn process_images(
        &self,
        metadata: AttachmentMetadata,
        id: AttachmentId,
    ) -> AttachmentMetadata {
        let attachment = match self.repository.get(id).await {
            Ok(Some(attachment)) => attachment,
            Ok(None) => {
                tracing::debug!(attachment_id = %id, "Unknown attachment, metadata unchanged");
                return metadata;
            }
            Err(e) => {
                tracing::warn!(attachment_id = %id, error = %e, "Attachment lookup failed, metadata unchanged");
                return metadata;
            }
        };

        if !attachment.is_image() {
            tracing::debug!(
                attachment_id = %id,
                mime_type = %attachment.mime_type,
                "Not an image, metadata unchanged"
            );
            return metadata;
        }

        self.service
            .process_attachment(id, &attachment.mime_type, metadata)
            .await
    }
}
