pub mod attachment;

pub use attachment::{Attachment, AttachmentId, AttachmentMetadata, ImageVariant, SizeMetadata};
