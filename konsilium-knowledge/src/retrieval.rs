//! Turns a question into a citation-annotated context block for prompt
//! injection.

use crate::embeddings::EmbeddingClient;
use crate::errors::KnowledgeResult;
use crate::models::SearchHit;
use crate::storage::SegmentStore;

const CONTEXT_PREAMBLE: &str = "Based on the following medical guidelines:";
const SEGMENT_DELIMITER: &str = "\n---\n";

/// Embed the query, search the store under a hard domain filter and format
/// the hits into one context block, best match first. The generation step
/// weights earlier context more heavily, so the strongest evidence leads.
///
/// Returns an empty string when nothing was retrieved; callers treat that as
/// "proceed ungrounded", not as an error. Nothing is cached between calls.
pub async fn build_context(
    embedder: &EmbeddingClient,
    store: &SegmentStore,
    query: &str,
    domain: &str,
    n_results: usize,
) -> KnowledgeResult<String> {
    let query_vector = embedder.embed(query).await?;
    let hits = store.search(&query_vector, n_results, Some(domain)).await?;
    Ok(format_context(&hits))
}

/// Format hits in their ranked order, citing source and page before each
/// segment's text.
pub fn format_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Reference {} - {}, page {}]:\n{}\n",
                i + 1,
                hit.segment.source,
                hit.segment.page,
                hit.segment.content
            )
        })
        .collect();

    format!("{CONTEXT_PREAMBLE}\n\n{}", parts.join(SEGMENT_DELIMITER))
}
