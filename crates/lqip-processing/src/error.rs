use thiserror::Error;

/// Errors raised while turning one image into a placeholder.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Image decode failed: {0}")]
    DecodeFailed(String),
    #[error("Image encoding failed: {0}")]
    EncodeFailed(String),
    #[error("Image has no pixels")]
    EmptyImage,
}

impl From<TransformError> for lqip_core::AppError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::UnsupportedFormat(mime) => {
                lqip_core::AppError::UnsupportedMediaType(mime)
            }
            other => lqip_core::AppError::ImageProcessing(other.to_string()),
        }
    }
}
