use std::path::Path;

use crate::chunker::{chunk_pages, segment_id};
use crate::embeddings::EmbeddingClient;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::loader::load_document;
use crate::models::{IngestReport, Segment};
use crate::storage::SegmentStore;

/// Ingest one guideline document into the store under `domain`.
///
/// Segments are embedded and written in batches; a failure mid-stream
/// reports how many segments were already written and leaves them in place
/// (no rollback). Re-running with identical content and chunk parameters
/// reproduces the same segment ids, so it overwrites rather than duplicates.
/// Clearing a domain before rebuilding is the caller's decision.
pub async fn ingest_document(
    store: &SegmentStore,
    embedder: &EmbeddingClient,
    path: &Path,
    domain: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
) -> KnowledgeResult<IngestReport> {
    let document = load_document(path).await?;
    let drafts = chunk_pages(&document.pages, chunk_size, chunk_overlap)?;
    tracing::info!(
        "Chunked {} into {} segments (domain: {})",
        document.source,
        drafts.len(),
        domain
    );

    let segments: Vec<Segment> = drafts
        .into_iter()
        .map(|draft| Segment {
            id: segment_id(domain, draft.ordinal, &draft.text),
            domain: domain.to_string(),
            source: document.source.clone(),
            page: draft.page as i64,
            ordinal: draft.ordinal as i64,
            content: draft.text,
        })
        .collect();

    let mut written = 0;
    for batch in segments.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|s| s.content.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| partial_failure(written, e))?;
        store
            .upsert(batch, &vectors)
            .await
            .map_err(|e| partial_failure(written, e))?;
        written += batch.len();
    }

    Ok(IngestReport {
        source: document.source,
        domain: domain.to_string(),
        segments_created: written,
    })
}

fn partial_failure(segments_written: usize, err: KnowledgeError) -> KnowledgeError {
    KnowledgeError::Ingest {
        segments_written,
        reason: err.to_string(),
    }
}
