pub mod chunker;
pub mod store;

pub use chunker::{split_document, Chunk, ChunkConfig};
pub use store::{ScoredChunk, VectorIndex, VectorIndexStore, DEFAULT_TOP_K};
