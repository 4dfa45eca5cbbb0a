//! Attachment metadata as stored by the host media library.
//!
//! The serialized layout mirrors the host's attachment metadata: a primary
//! `file` with its dimensions and a `sizes` map of registered size entries.
//! Placeholders live in the optional `base64` field of each size entry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::FULL_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub u64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AttachmentId {
    fn from(id: u64) -> Self {
        AttachmentId(id)
    }
}

/// One registered size entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeMetadata {
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Field written by older releases.
    #[serde(
        rename = "blurDataURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub blur_data_url: Option<String>,
    /// Host fields this crate does not interpret (filesize, ...).
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SizeMetadata {
    pub fn new(file: impl Into<String>, width: u32, height: u32, mime_type: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            width,
            height,
            mime_type: mime_type.into(),
            base64: None,
            blur_data_url: None,
            extra: Map::new(),
        }
    }

    /// Stored placeholder, falling back to the legacy field.
    pub fn placeholder(&self) -> Option<&str> {
        self.base64.as_deref().or(self.blur_data_url.as_deref())
    }
}

/// Metadata of one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// Primary file, relative to the uploads base directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub sizes: BTreeMap<String, SizeMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AttachmentMetadata {
    pub fn new(file: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            file: file.into(),
            width,
            height,
            sizes: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Directory of the primary file, without a trailing slash.
    fn file_dir(&self) -> Option<&str> {
        self.file.rfind('/').map(|idx| &self.file[..idx])
    }

    /// Basename of the primary file.
    pub fn file_name(&self) -> &str {
        match self.file.rfind('/') {
            Some(idx) => &self.file[idx + 1..],
            None => &self.file,
        }
    }

    /// Every variant of this attachment: the registered sizes followed by a
    /// synthetic `full` entry for the primary file.
    pub fn variants(&self, mime_type: &str) -> Vec<ImageVariant> {
        let dir = self.file_dir();
        let mut variants: Vec<ImageVariant> = self
            .sizes
            .iter()
            .filter(|(key, _)| key.as_str() != FULL_SIZE)
            .map(|(key, size)| ImageVariant {
                size_key: key.clone(),
                relative_path: match dir {
                    Some(dir) => format!("{}/{}", dir, size.file),
                    None => size.file.clone(),
                },
                width: size.width,
                height: size.height,
                mime_type: mime_type.to_string(),
            })
            .collect();

        variants.push(ImageVariant {
            size_key: FULL_SIZE.to_string(),
            relative_path: self.file.clone(),
            width: self.width,
            height: self.height,
            mime_type: mime_type.to_string(),
        });

        variants
    }

    /// Placeholder stored for `size`, if any.
    pub fn placeholder(&self, size: &str) -> Option<&str> {
        self.sizes.get(size).and_then(SizeMetadata::placeholder)
    }

    /// True when the primary file or any registered size has no `base64` field.
    pub fn is_missing_placeholder(&self) -> bool {
        let full_missing = self
            .sizes
            .get(FULL_SIZE)
            .map_or(true, |full| full.base64.is_none());
        full_missing || self.sizes.values().any(|size| size.base64.is_none())
    }
}

/// One registered size of an attachment, resolved to a path under the uploads
/// base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    pub size_key: String,
    pub relative_path: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// An attachment with its MIME type and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub mime_type: String,
    pub metadata: AttachmentMetadata,
}

impl Attachment {
    /// Whether the host considers this attachment an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}
