//! LQIP Processing Library
//!
//! Turns a raster image into a tiny blurred same-format preview encoded as base64.
//! The [`FormatDispatcher`] maps MIME types to codecs and the
//! [`PlaceholderTransformer`] runs the downscale, blur and re-encode steps.

pub mod error;
pub mod image;

// Re-export commonly used types
pub use error::TransformError;
pub use image::{Codec, FormatDispatcher, ImageMime, Placeholder, PlaceholderTransformer};
