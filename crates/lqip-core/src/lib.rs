//! LQIP Core Library
//!
//! This crate provides the domain models, error types, configuration and constants
//! shared by every component of the placeholder pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BackfillConfig, Config, PlaceholderConfig, UploadsConfig};
pub use error::{AppError, LogLevel};
pub use models::{Attachment, AttachmentId, AttachmentMetadata, ImageVariant, SizeMetadata};
