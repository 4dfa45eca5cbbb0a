//! Image placeholder module
//!
//! - Format dispatch from MIME type to codec (format)
//! - Target size and filter selection (resize)
//! - Downscale, blur, alpha handling and base64 encoding (transformer)

pub mod format;
pub mod resize;
pub mod transformer;

pub use format::{Codec, FormatDispatcher, ImageMime};
pub use transformer::{Placeholder, PlaceholderTransformer};
