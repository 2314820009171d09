pub mod chunker;
pub mod mime;

pub use chunker::{ChunkSpan, Chunker};
pub use mime::detect_source_type;
