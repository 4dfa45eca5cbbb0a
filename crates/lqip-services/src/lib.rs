//! LQIP Services Layer
//!
//! Orchestration on top of processing, storage and the attachment repository:
//! the per-attachment placeholder service, the metadata hooks the host calls on
//! upload and edit, the placeholder lookup with its filter chain, and the
//! resolvers behind the schema fields.

pub mod services;

pub use lqip_processing::{FormatDispatcher, Placeholder, PlaceholderTransformer};
pub use lqip_storage::{create_sources, SourceBackend, SourceLoader, Sources, StorageError};
pub use services::{
    graphql::{media_item_placeholder, media_size_placeholder, resolve_size_argument},
    hooks::MetadataHooks,
    lookup::{PlaceholderFilter, PlaceholderLookup},
    placeholder::{PlaceholderService, VariantOutcome},
};
