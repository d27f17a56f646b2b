use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("missing data directory")]
    MissingDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("sqlite-vec initialization error: {0}")]
    SqliteVec(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("guideline document not found: {0}")]
    DocumentNotFound(PathBuf),
    #[error(
        "invalid chunking parameters: chunk_overlap ({chunk_overlap}) must be \
         smaller than chunk_size ({chunk_size})"
    )]
    InvalidChunking {
        chunk_size: usize,
        chunk_overlap: usize,
    },
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("segment/vector length mismatch: {segments} segments, {vectors} vectors")]
    LengthMismatch { segments: usize, vectors: usize },
    #[error("ingestion failed after writing {segments_written} segments: {reason}")]
    Ingest {
        segments_written: usize,
        reason: String,
    },
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
