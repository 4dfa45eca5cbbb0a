pub mod attachment;
pub mod json_file;
pub mod memory;

pub use attachment::{AttachmentRepository, MissingPlaceholderQuery};
pub use json_file::JsonFileAttachmentRepository;
pub use memory::InMemoryAttachmentRepository;
