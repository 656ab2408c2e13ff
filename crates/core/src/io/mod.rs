//! I/O for label stacks: multi-page TIFF codec plus source/sink stores

mod native;
mod store;

pub use native::{read_stack, read_stack_from_buffer, write_stack, write_stack_to_buffer};
pub use store::{MemoryStore, Sink, SourceStore, StackMetadata, TiffStore, TiffStoreOptions};
