//! Placeholder transformer - downscale, blur and re-encode
//!
//! Opaque formats are downscaled and blurred directly. PNG goes through an
//! alpha-preserving path: the source is resampled onto a half-transparent white
//! base layer before blurring, so transparent regions keep a soft, non-zero alpha
//! and the blur does not produce hard edges at the canvas border.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};

use lqip_core::PlaceholderConfig;

use crate::error::TransformError;
use crate::image::format::{Codec, EncodeFn};
use crate::image::resize::{scaled_dimensions, select_filter};

/// Standard deviation of one blur pass. Matches a single 3x3 binomial kernel.
const BLUR_SIGMA: f32 = 0.85;

/// Alpha of the base layer under PNG placeholders (about half transparent).
const BASE_LAYER_ALPHA: u8 = 127;

/// A generated placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Standard base64 of the encoded image.
    pub encoded_data: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

impl Placeholder {
    /// `data:` URI ready to be used as an image source.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.encoded_data)
    }
}

/// Runs the transform steps with a fixed configuration.
#[derive(Debug, Clone)]
pub struct PlaceholderTransformer {
    max_width: u32,
    blur_strength: u32,
}

impl PlaceholderTransformer {
    pub fn new(config: &PlaceholderConfig) -> Self {
        Self {
            max_width: config.max_width.max(1),
            blur_strength: config.blur_strength,
        }
    }

    /// Scale `image` so its width equals the configured maximum.
    pub fn downscale(&self, image: &DynamicImage) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();
        let (width, height) = scaled_dimensions(orig_width, orig_height, self.max_width);
        let filter = select_filter(orig_width, orig_height, width, height);
        image.resize_exact(width, height, filter)
    }

    /// Apply `blur_strength` sequential Gaussian blur passes in place.
    pub fn blur(&self, image: &mut DynamicImage) {
        for _ in 0..self.blur_strength {
            *image = image.blur(BLUR_SIGMA);
        }
    }

    /// Downscale then blur. Used for formats without alpha handling.
    pub fn process_opaque(&self, image: &DynamicImage) -> DynamicImage {
        let mut downscaled = self.downscale(image);
        self.blur(&mut downscaled);
        downscaled
    }

    /// Downscale onto a half-transparent white canvas, then blur.
    pub fn process_alpha(&self, image: &DynamicImage) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();
        let (width, height) = scaled_dimensions(orig_width, orig_height, self.max_width);

        // Base layer. The resampled source is alpha-blended over it below.
        let mut canvas =
            RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, BASE_LAYER_ALPHA]));

        let filter = select_filter(orig_width, orig_height, width, height);
        let resampled = image.resize_exact(width, height, filter).to_rgba8();
        imageops::overlay(&mut canvas, &resampled, 0, 0);

        let mut result = DynamicImage::ImageRgba8(canvas);
        self.blur(&mut result);
        result
    }

    /// Encode `image` into memory with `encode` and return standard base64.
    pub fn encode_to_base64(
        &self,
        image: &DynamicImage,
        encode: EncodeFn,
    ) -> Result<String, TransformError> {
        let mut buffer = Vec::new();
        encode(image, &mut buffer)?;
        Ok(STANDARD.encode(&buffer))
    }

    /// Decode `data` with `codec`, process it according to its alpha flag and
    /// return the encoded placeholder.
    pub fn generate(&self, data: &[u8], codec: &Codec) -> Result<Placeholder, TransformError> {
        let source = (codec.decode)(data)?;
        if source.width() == 0 || source.height() == 0 {
            return Err(TransformError::EmptyImage);
        }

        let processed = if codec.preserves_alpha {
            self.process_alpha(&source)
        } else {
            self.process_opaque(&source)
        };

        let encoded_data = self.encode_to_base64(&processed, codec.encode)?;

        tracing::trace!(
            mime_type = codec.mime.mime_type(),
            source_width = source.width(),
            source_height = source.height(),
            width = processed.width(),
            height = processed.height(),
            encoded_len = encoded_data.len(),
            "Placeholder generated"
        );

        Ok(Placeholder {
            encoded_data,
            width: processed.width(),
            height: processed.height(),
            mime_type: codec.mime.mime_type(),
        })
    }
}

impl Default for PlaceholderTransformer {
    fn default() -> Self {
        Self::new(&PlaceholderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::format::ImageMime;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn decode_placeholder(placeholder: &Placeholder, format: ImageFormat) -> DynamicImage {
        let bytes = STANDARD.decode(&placeholder.encoded_data).unwrap();
        image::load_from_memory_with_format(&bytes, format).unwrap()
    }

    fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, 128])
        });
        encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    /// 50x50 transparent PNG with an opaque 10x10 square in the middle.
    fn centered_square_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(50, 50, |x, y| {
            if (20..30).contains(&x) && (20..30).contains(&y) {
                Rgba([200, 30, 30, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    #[test]
    fn jpeg_120x90_becomes_8x6_jpeg() {
        let transformer = PlaceholderTransformer::default();
        let codec = ImageMime::Jpeg.codec();

        let placeholder = transformer.generate(&gradient_jpeg(120, 90), &codec).unwrap();

        assert!(!placeholder.encoded_data.is_empty());
        assert_eq!((placeholder.width, placeholder.height), (8, 6));
        let decoded = decode_placeholder(&placeholder, ImageFormat::Jpeg);
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[test]
    fn png_keeps_alpha_and_soft_transparent_base() {
        let transformer = PlaceholderTransformer::default();
        let codec = ImageMime::Png.codec();

        let placeholder = transformer.generate(&centered_square_png(), &codec).unwrap();
        let decoded = decode_placeholder(&placeholder, ImageFormat::Png);

        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (8, 8));

        let rgba = decoded.to_rgba8();
        let corners = [(0, 0), (7, 0), (0, 7), (7, 7)];
        let corner_alpha: f32 = corners
            .iter()
            .map(|&(x, y)| rgba.get_pixel(x, y)[3] as f32)
            .sum::<f32>()
            / corners.len() as f32;
        let center = [(3, 3), (4, 3), (3, 4), (4, 4)];
        let center_alpha: f32 = center
            .iter()
            .map(|&(x, y)| rgba.get_pixel(x, y)[3] as f32)
            .sum::<f32>()
            / center.len() as f32;

        assert!(corner_alpha < center_alpha);
        assert!(
            (corner_alpha - BASE_LAYER_ALPHA as f32).abs() <= 8.0,
            "corner alpha {corner_alpha} not close to base layer"
        );
    }

    #[test]
    fn opaque_formats_preserve_format_and_width_bound() {
        let transformer = PlaceholderTransformer::default();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 40, Rgba([0, 90, 200, 255])));

        for (mime, format) in [
            (ImageMime::Gif, ImageFormat::Gif),
            (ImageMime::WebP, ImageFormat::WebP),
        ] {
            let placeholder = transformer
                .generate(&encode(&img, format), &mime.codec())
                .unwrap();
            let decoded = decode_placeholder(&placeholder, format);
            assert_eq!(decoded.dimensions(), (8, 5), "{mime:?}");
            assert_eq!(placeholder.mime_type, mime.mime_type());
        }
    }

    #[test]
    fn configured_width_is_respected() {
        let transformer = PlaceholderTransformer::new(&PlaceholderConfig {
            max_width: 16,
            ..PlaceholderConfig::default()
        });
        let placeholder = transformer
            .generate(&gradient_jpeg(120, 90), &ImageMime::Jpeg.codec())
            .unwrap();
        assert_eq!((placeholder.width, placeholder.height), (16, 12));
    }

    #[test]
    fn blur_strength_applies_sequential_passes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }));

        let once = PlaceholderTransformer::new(&PlaceholderConfig {
            blur_strength: 1,
            ..PlaceholderConfig::default()
        });
        let twice = PlaceholderTransformer::new(&PlaceholderConfig {
            blur_strength: 2,
            ..PlaceholderConfig::default()
        });

        let mut a = img.clone();
        once.blur(&mut a);
        once.blur(&mut a);
        let mut b = img.clone();
        twice.blur(&mut b);

        assert_eq!(a.to_rgb8().into_raw(), b.to_rgb8().into_raw());
        assert_ne!(b.to_rgb8().into_raw(), img.to_rgb8().into_raw());
    }

    #[test]
    fn zero_strength_leaves_image_untouched() {
        let transformer = PlaceholderTransformer::new(&PlaceholderConfig {
            blur_strength: 0,
            ..PlaceholderConfig::default()
        });
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])));
        let mut blurred = img.clone();
        transformer.blur(&mut blurred);
        assert_eq!(blurred.to_rgb8().into_raw(), img.to_rgb8().into_raw());
    }

    #[test]
    fn corrupt_input_is_an_error() {
        let transformer = PlaceholderTransformer::default();
        let err = transformer
            .generate(b"\x89PNG\r\n\x1a\ntruncated", &ImageMime::Png.codec())
            .unwrap_err();
        assert!(matches!(err, TransformError::DecodeFailed(_)));
    }

    #[test]
    fn data_uri_has_mime_prefix() {
        let placeholder = Placeholder {
            encoded_data: "AAAA".to_string(),
            width: 1,
            height: 1,
            mime_type: "image/png",
        };
        assert_eq!(placeholder.to_data_uri(), "data:image/png;base64,AAAA");
    }
}
