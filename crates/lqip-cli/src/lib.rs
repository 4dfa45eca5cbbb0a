use std::path::Path;

use lqip_processing::{ImageMime, Placeholder};

/// MIME type guessed from a file extension, for files passed without `--mime`.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => ImageMime::Jpeg,
        "png" => ImageMime::Png,
        "gif" => ImageMime::Gif,
        "webp" => ImageMime::WebP,
        _ => return None,
    };
    Some(mime.mime_type())
}

/// Text printed for a generated placeholder.
pub fn render_placeholder(placeholder: &Placeholder, data_uri: bool) -> String {
    if data_uri {
        placeholder.to_data_uri()
    } else {
        placeholder.encoded_data.clone()
    }
}
