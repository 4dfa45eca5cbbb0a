//! Per-attachment placeholder generation.
//!
//! Every variant of an attachment (registered sizes plus the primary file as
//! `full`) is read from the uploads directory, falling back to the public URL,
//! and run through the transformer. A variant that cannot be processed is left
//! untouched; siblings are still processed and nothing is returned as an error.

use std::sync::Arc;
use std::time::Instant;

use lqip_core::constants::FULL_SIZE;
use lqip_core::{
    AppError, AttachmentId, AttachmentMetadata, ImageVariant, PlaceholderConfig, SizeMetadata,
};
use lqip_processing::{Codec, FormatDispatcher, Placeholder, PlaceholderTransformer};
use lqip_storage::{SourceBackend, SourceLoader, Sources};

/// Result of processing one variant.
#[derive(Debug)]
pub enum VariantOutcome {
    Generated {
        placeholder: Placeholder,
        source: SourceBackend,
    },
    Skipped {
        local_error: String,
        remote_error: String,
    },
}

impl VariantOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, VariantOutcome::Generated { .. })
    }
}

pub struct PlaceholderService {
    dispatcher: FormatDispatcher,
    transformer: PlaceholderTransformer,
    sources: Sources,
}

impl PlaceholderService {
    pub fn new(config: &PlaceholderConfig, sources: Sources) -> Self {
        Self {
            dispatcher: FormatDispatcher::new(),
            transformer: PlaceholderTransformer::new(config),
            sources,
        }
    }

    pub fn dispatcher(&self) -> &FormatDispatcher {
        &self.dispatcher
    }

    /// Generate placeholders for every variant of an attachment and fold them
    /// into `metadata`.
    ///
    /// Unsupported MIME types return `metadata` unchanged.
    #[tracing::instrument(skip(self, id, metadata), fields(attachment_id = %id))]
    pub async fn process_attachment(
        &self,
        id: AttachmentId,
        mime_type: &str,
        mut metadata: AttachmentMetadata,
    ) -> AttachmentMetadata {
        let codec = match self.dispatcher.codec_for(mime_type) {
            Ok(codec) => *codec,
            Err(e) => {
                tracing::debug!(error = %e, "Leaving metadata unchanged");
                return metadata;
            }
        };

        let start = Instant::now();
        let variants = metadata.variants(mime_type);
        let total = variants.len();
        let mut generated = 0usize;

        for variant in variants {
            match self.process_variant(&variant, codec).await {
                VariantOutcome::Generated {
                    placeholder,
                    source,
                } => {
                    tracing::debug!(
                        size = %variant.size_key,
                        source = %source,
                        width = placeholder.width,
                        height = placeholder.height,
                        "Placeholder generated"
                    );
                    merge_placeholder(&mut metadata, &variant, mime_type, placeholder.encoded_data);
                    generated += 1;
                }
                VariantOutcome::Skipped {
                    local_error,
                    remote_error,
                } => {
                    tracing::warn!(
                        size = %variant.size_key,
                        path = %variant.relative_path,
                        local_error = %local_error,
                        remote_error = %remote_error,
                        "Skipping variant"
                    );
                }
            }
        }

        tracing::info!(
            mime_type = %mime_type,
            variants = total,
            generated,
            duration_ms = start.elapsed().as_millis() as u64,
            "Attachment processed"
        );

        metadata
    }

    /// Try the local copy of `variant`, then its public URL.
    pub async fn process_variant(&self, variant: &ImageVariant, codec: Codec) -> VariantOutcome {
        let local_error = match self
            .generate_from(&self.sources.local, &variant.relative_path, codec)
            .await
        {
            Ok(placeholder) => {
                return VariantOutcome::Generated {
                    placeholder,
                    source: SourceBackend::Local,
                }
            }
            Err(e) => e.to_string(),
        };

        tracing::debug!(
            size = %variant.size_key,
            error = %local_error,
            "Local source unusable, falling back to remote"
        );

        match self
            .generate_from(&self.sources.remote, &variant.relative_path, codec)
            .await
        {
            Ok(placeholder) => VariantOutcome::Generated {
                placeholder,
                source: SourceBackend::Remote,
            },
            Err(e) => VariantOutcome::Skipped {
                local_error,
                remote_error: e.to_string(),
            },
        }
    }

    async fn generate_from(
        &self,
        source: &Arc<dyn SourceLoader>,
        location: &str,
        codec: Codec,
    ) -> Result<Placeholder, AppError> {
        let data = source.load(location).await?;
        let transformer = self.transformer.clone();

        let placeholder = tokio::task::spawn_blocking(move || transformer.generate(&data, &codec))
            .await
            .map_err(|e| AppError::Internal(format!("Transform task failed: {}", e)))??;

        Ok(placeholder)
    }
}

fn merge_placeholder(
    metadata: &mut AttachmentMetadata,
    variant: &ImageVariant,
    mime_type: &str,
    encoded_data: String,
) {
    if variant.size_key == FULL_SIZE {
        let mut full = metadata
            .sizes
            .remove(FULL_SIZE)
            .unwrap_or_else(|| SizeMetadata::new("", 0, 0, mime_type));
        full.file = metadata.file_name().to_string();
        full.width = metadata.width;
        full.height = metadata.height;
        full.mime_type = mime_type.to_string();
        full.base64 = Some(encoded_data);
        metadata.sizes.insert(FULL_SIZE.to_string(), full);
    } else if let Some(entry) = metadata.sizes.get_mut(&variant.size_key) {
        entry.base64 = Some(encoded_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(size_key: &str) -> ImageVariant {
        ImageVariant {
            size_key: size_key.to_string(),
            relative_path: String::new(),
            width: 0,
            height: 0,
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn full_entry_is_a_complete_record() {
        let mut metadata = AttachmentMetadata::new("2024/05/logo.png", 640, 320);
        merge_placeholder(&mut metadata, &variant(FULL_SIZE), "image/png", "QUJD".to_string());

        let full = &metadata.sizes[FULL_SIZE];
        assert_eq!(full.file, "logo.png");
        assert_eq!((full.width, full.height), (640, 320));
        assert_eq!(full.mime_type, "image/png");
        assert_eq!(full.base64.as_deref(), Some("QUJD"));
    }

    #[test]
    fn existing_full_entry_keeps_unknown_fields() {
        let mut metadata = AttachmentMetadata::new("logo.png", 10, 5);
        let mut stored = SizeMetadata::new("old.png", 1, 1, "image/png");
        stored
            .extra
            .insert("filesize".to_string(), serde_json::json!(1234));
        metadata.sizes.insert(FULL_SIZE.to_string(), stored);

        merge_placeholder(&mut metadata, &variant(FULL_SIZE), "image/png", "QUJD".to_string());

        let full = &metadata.sizes[FULL_SIZE];
        assert_eq!(full.file, "logo.png");
        assert_eq!(full.extra["filesize"], 1234);
    }

    #[test]
    fn unknown_size_is_not_created() {
        let mut metadata = AttachmentMetadata::new("logo.png", 10, 5);
        merge_placeholder(&mut metadata, &variant("medium"), "image/png", "QUJD".to_string());
        assert!(metadata.sizes.is_empty());
    }
}
