//! Guideline retrieval subsystem for KONSILIUM: chunking, embedding,
//! vector indexing and context assembly.

pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod paths;
pub mod retrieval;
pub mod storage;

pub use konsilium_core::KnowledgeSettings;

pub use embeddings::EmbeddingClient;
pub use engine::KnowledgeEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use models::{IndexStats, IngestReport, SearchHit, Segment};
pub use storage::SegmentStore;
