pub mod graphql;
pub mod hooks;
pub mod lookup;
pub mod placeholder;

pub use graphql::{media_item_placeholder, media_size_placeholder, resolve_size_argument};
pub use hooks::MetadataHooks;
pub use lookup::{PlaceholderFilter, PlaceholderLookup};
pub use placeholder::{PlaceholderService, VariantOutcome};
