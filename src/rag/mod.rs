pub mod chunker;
pub mod context;
pub mod index;
pub mod retriever;

pub use chunker::{chunk_text, Chunk};
pub use context::{assemble, CHUNK_SEPARATOR};
pub use index::{dot_similarity, normalize, ScoredChunk, VectorIndex};
pub use retriever::retrieve;
