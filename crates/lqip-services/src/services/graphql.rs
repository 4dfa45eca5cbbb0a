//! Resolvers behind the `base64` field on the media size and media item types.
//!
//! Both read the stored value and fall back to the legacy `blurDataURL` key.

use lqip_core::constants::{POST_THUMBNAIL_SIZE, THUMBNAIL_SIZE};
use lqip_core::{AttachmentMetadata, SizeMetadata};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// `MediaSize.base64`
pub fn media_size_placeholder(size: &SizeMetadata) -> Option<&str> {
    non_empty(size.base64.as_deref()).or_else(|| non_empty(size.blur_data_url.as_deref()))
}

/// Size key a `MediaItem.base64(size:)` argument resolves to.
pub fn resolve_size_argument(size: Option<&str>) -> &str {
    match size {
        None | Some("") => THUMBNAIL_SIZE,
        Some(POST_THUMBNAIL_SIZE) => THUMBNAIL_SIZE,
        Some(size) => size,
    }
}

/// `MediaItem.base64(size:)`
pub fn media_item_placeholder<'a>(
    metadata: &'a AttachmentMetadata,
    size: Option<&str>,
) -> Option<&'a str> {
    metadata
        .sizes
        .get(resolve_size_argument(size))
        .and_then(media_size_placeholder)
}
