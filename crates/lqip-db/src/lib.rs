//! LQIP Database Layer
//!
//! Persistence of attachment metadata. The host's metadata store is reached
//! through [`AttachmentRepository`]; the crate ships an in-memory backend and a
//! JSON file backend used by the CLI.

pub mod db;

pub use db::*;
