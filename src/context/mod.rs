//! Context compression: chunking and similarity ranking of fetched documents.

pub mod chunker;
pub mod compressor;

pub use chunker::Chunker;
pub use compressor::{ContextCompressor, rank_chunks};
