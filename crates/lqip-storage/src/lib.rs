//! LQIP Storage Library
//!
//! Reads source images for placeholder generation. Two backends implement the
//! [`SourceLoader`] trait: the uploads directory on the local filesystem and the
//! public uploads URL, used as a fallback when the local read fails.
//!
//! # Locations
//!
//! Both backends take the same location: the path of the file relative to the
//! uploads base (for example `2024/05/photo-150x150.jpg`). Locations must not
//! contain a `..` component or a leading `/`.

pub mod factory;
pub mod local;
pub mod remote;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_sources, Sources};
pub use local::LocalSource;
pub use remote::RemoteSource;
pub use traits::{SourceBackend, SourceLoader, StorageError, StorageResult};
