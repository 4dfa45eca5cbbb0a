//! Format dispatch: MIME type to decode/encode pair and alpha handling.
//!
//! The subtype is matched verbatim. `image/jpg` or `image/PNG` are not
//! recognised; callers must pass the canonical names.

use image::{DynamicImage, ImageFormat, ImageReader};
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::TransformError;

pub type DecodeFn = fn(&[u8]) -> Result<DynamicImage, TransformError>;
pub type EncodeFn = fn(&DynamicImage, &mut Vec<u8>) -> Result<(), TransformError>;

/// Closed set of formats the pipeline can round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMime {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMime {
    pub const ALL: [ImageMime; 4] = [
        ImageMime::Jpeg,
        ImageMime::Png,
        ImageMime::Gif,
        ImageMime::WebP,
    ];

    /// Parse `image/<subtype>`; the subtype must match exactly.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let subtype = mime.strip_prefix("image/")?;
        Self::ALL.into_iter().find(|m| m.subtype() == subtype)
    }

    pub fn subtype(self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpeg",
            ImageMime::Png => "png",
            ImageMime::Gif => "gif",
            ImageMime::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Gif => "image/gif",
            ImageMime::WebP => "image/webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            ImageMime::Jpeg => ImageFormat::Jpeg,
            ImageMime::Png => ImageFormat::Png,
            ImageMime::Gif => ImageFormat::Gif,
            ImageMime::WebP => ImageFormat::WebP,
        }
    }

    /// Only PNG goes through the alpha-preserving path.
    pub fn preserves_alpha(self) -> bool {
        matches!(self, ImageMime::Png)
    }

    pub fn codec(self) -> Codec {
        let (decode, encode): (DecodeFn, EncodeFn) = match self {
            ImageMime::Jpeg => (decode_jpeg, encode_jpeg),
            ImageMime::Png => (decode_png, encode_png),
            ImageMime::Gif => (decode_gif, encode_gif),
            ImageMime::WebP => (decode_webp, encode_webp),
        };
        Codec {
            mime: self,
            decode,
            encode,
            preserves_alpha: self.preserves_alpha(),
        }
    }
}

/// Decode/encode pair for one format.
#[derive(Clone, Copy)]
pub struct Codec {
    pub mime: ImageMime,
    pub decode: DecodeFn,
    pub encode: EncodeFn,
    pub preserves_alpha: bool,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("mime", &self.mime)
            .field("preserves_alpha", &self.preserves_alpha)
            .finish()
    }
}

/// Lookup table from MIME type to codec, built once.
#[derive(Debug, Clone)]
pub struct FormatDispatcher {
    codecs: HashMap<&'static str, Codec>,
}

impl FormatDispatcher {
    pub fn new() -> Self {
        let codecs = ImageMime::ALL
            .into_iter()
            .map(|mime| (mime.mime_type(), mime.codec()))
            .collect();
        Self { codecs }
    }

    /// Codec for `mime`, or `None` when the format is not supported.
    pub fn resolve(&self, mime: &str) -> Option<&Codec> {
        self.codecs.get(mime)
    }

    /// Like [`resolve`](Self::resolve), reporting unknown types as
    /// [`TransformError::UnsupportedFormat`].
    pub fn codec_for(&self, mime: &str) -> Result<&Codec, TransformError> {
        self.resolve(mime)
            .ok_or_else(|| TransformError::UnsupportedFormat(mime.to_string()))
    }

    pub fn supported_mime_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }
}

impl Default for FormatDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_with(data: &[u8], format: ImageFormat) -> Result<DynamicImage, TransformError> {
    ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(|e| TransformError::DecodeFailed(e.to_string()))
}

fn encode_with(
    image: &DynamicImage,
    buffer: &mut Vec<u8>,
    format: ImageFormat,
) -> Result<(), TransformError> {
    let mut cursor = Cursor::new(buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|e| TransformError::EncodeFailed(e.to_string()))
}

fn decode_jpeg(data: &[u8]) -> Result<DynamicImage, TransformError> {
    decode_with(data, ImageFormat::Jpeg)
}

fn decode_png(data: &[u8]) -> Result<DynamicImage, TransformError> {
    decode_with(data, ImageFormat::Png)
}

fn decode_gif(data: &[u8]) -> Result<DynamicImage, TransformError> {
    decode_with(data, ImageFormat::Gif)
}

fn decode_webp(data: &[u8]) -> Result<DynamicImage, TransformError> {
    decode_with(data, ImageFormat::WebP)
}

// The JPEG encoder has no alpha support.
fn encode_jpeg(image: &DynamicImage, buffer: &mut Vec<u8>) -> Result<(), TransformError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    encode_with(&rgb, buffer, ImageFormat::Jpeg)
}

fn encode_png(image: &DynamicImage, buffer: &mut Vec<u8>) -> Result<(), TransformError> {
    encode_with(image, buffer, ImageFormat::Png)
}

fn encode_gif(image: &DynamicImage, buffer: &mut Vec<u8>) -> Result<(), TransformError> {
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
    encode_with(&rgba, buffer, ImageFormat::Gif)
}

fn encode_webp(image: &DynamicImage, buffer: &mut Vec<u8>) -> Result<(), TransformError> {
    let normalized = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    encode_with(&normalized, buffer, ImageFormat::WebP)
}
