//! Attachment repository backed by a JSON library file.
//!
//! The file holds `{ "attachments": [ ... ] }`. Every metadata update rewrites
//! the whole file through a temporary sibling and an atomic rename. The
//! in-memory copy only changes once that write has succeeded.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

use lqip_core::{AppError, Attachment, AttachmentId, AttachmentMetadata};

use super::attachment::{AttachmentRepository, MissingPlaceholderQuery};
use super::memory::InMemoryAttachmentRepository;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

pub struct JsonFileAttachmentRepository {
    path: PathBuf,
    inner: InMemoryAttachmentRepository,
    write_lock: Mutex<()>,
}

impl JsonFileAttachmentRepository {
    /// Load the library at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let raw = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read library file {}", path.display()))?;
        let library: LibraryFile = serde_json::from_slice(&raw)?;

        tracing::info!(
            path = %path.display(),
            attachments = library.attachments.len(),
            "Attachment library loaded"
        );

        Ok(Self {
            path,
            inner: InMemoryAttachmentRepository::with_attachments(library.attachments),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(&self, library: &LibraryFile) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(library)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for JsonFileAttachmentRepository {
    async fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, AppError> {
        self.inner.get(id).await
    }

    async fn find_missing_placeholder(
        &self,
        query: &MissingPlaceholderQuery,
    ) -> Result<Vec<Attachment>, AppError> {
        self.inner.find_missing_placeholder(query).await
    }

    async fn count_missing_placeholder(&self, mime_types: &[String]) -> Result<usize, AppError> {
        self.inner.count_missing_placeholder(mime_types).await
    }

    #[tracing::instrument(skip(self, metadata), fields(path = %self.path.display()))]
    async fn update_metadata(
        &self,
        id: AttachmentId,
        metadata: AttachmentMetadata,
    ) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut attachments = self.inner.all().await;
        let attachment = attachments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;
        attachment.metadata = metadata.clone();

        self.persist(&LibraryFile { attachments }).await?;
        self.inner.update_metadata(id, metadata).await
    }
}
