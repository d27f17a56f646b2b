use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One indexed unit of guideline text with positional and domain metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Deterministic id: `{domain}_{ordinal}_{content-hash prefix}`.
    pub id: String,
    /// Specialist/guideline partition. Set at ingestion, never changed.
    pub domain: String,
    /// Originating document (path or stable name). Citation only.
    pub source: String,
    /// 1-based page the segment starts on. Citation only.
    pub page: i64,
    /// 0-based sequence index within the source document.
    pub ordinal: i64,
    pub content: String,
}

/// One search result: a segment and its cosine distance to the query
/// (smaller is more similar).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub segment: Segment,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_segments: i64,
    pub per_domain: BTreeMap<String, i64>,
}

/// Outcome of a completed ingestion run for one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub domain: String,
    pub segments_created: usize,
}
