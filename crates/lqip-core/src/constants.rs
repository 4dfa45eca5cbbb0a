//! Shared constants.

/// Size key of the synthetic entry built from the attachment's primary file.
pub const FULL_SIZE: &str = "full";

/// Default size requested by lookups and schema resolvers.
pub const THUMBNAIL_SIZE: &str = "thumbnail";

/// Legacy size name that resolves to [`THUMBNAIL_SIZE`].
pub const POST_THUMBNAIL_SIZE: &str = "post-thumbnail";

/// Default instance slug used to derive the scheduled job name.
pub const DEFAULT_SLUG: &str = "image-base64";

/// MIME types the pipeline knows how to decode and re-encode.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Name of the one-shot backfill job for an instance slug.
pub fn hook_process_media(slug: &str) -> String {
    format!("{}_hook_process_media", slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_name_is_derived_from_slug() {
        assert_eq!(
            hook_process_media(DEFAULT_SLUG),
            "image-base64_hook_process_media"
        );
        assert_eq!(hook_process_media("site-2"), "site-2_hook_process_media");
    }
}
