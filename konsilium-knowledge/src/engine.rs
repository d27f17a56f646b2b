use std::path::Path;

use sqlx::SqlitePool;

use crate::embeddings::EmbeddingClient;
use crate::errors::KnowledgeResult;
use crate::models::{IndexStats, IngestReport, SearchHit};
use crate::paths::index_db_path;
use crate::storage::SegmentStore;
use crate::{ingest, retrieval};
use konsilium_core::KnowledgeSettings;

/// Owned handle over the embedding client and segment store.
///
/// Constructed explicitly and passed to whatever needs it, so tests can run
/// isolated instances side by side. There is deliberately no process-wide
/// singleton.
#[derive(Debug, Clone)]
pub struct KnowledgeEngine {
    settings: KnowledgeSettings,
    embedder: EmbeddingClient,
    store: SegmentStore,
}

impl KnowledgeEngine {
    pub async fn open(settings: KnowledgeSettings) -> KnowledgeResult<Self> {
        let path = index_db_path(&settings)?;
        let store = SegmentStore::open(&path, settings.embedding_dim).await?;
        let embedder = EmbeddingClient::new(&settings);
        Ok(Self {
            settings,
            embedder,
            store,
        })
    }

    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// Access the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    /// Chunk, embed and index one guideline document under `domain`, using
    /// the configured chunk parameters.
    pub async fn ingest_guideline(&self, path: &Path, domain: &str) -> KnowledgeResult<IngestReport> {
        ingest::ingest_document(
            &self.store,
            &self.embedder,
            path,
            domain,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
            self.settings.embedding_batch,
        )
        .await
    }

    /// Assemble the grounding context for a question, or the empty-string
    /// sentinel when the domain has nothing relevant.
    pub async fn build_context(&self, question: &str, domain: &str) -> KnowledgeResult<String> {
        retrieval::build_context(
            &self.embedder,
            &self.store,
            question,
            domain,
            self.settings.n_results,
        )
        .await
    }

    pub async fn search(
        &self,
        question: &str,
        domain: Option<&str>,
        top_k: usize,
    ) -> KnowledgeResult<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(question).await?;
        self.store.search(&query_vector, top_k, domain).await
    }

    pub async fn stats(&self) -> KnowledgeResult<IndexStats> {
        self.store.stats().await
    }

    pub async fn clear_domain(&self, domain: &str) -> KnowledgeResult<u64> {
        self.store.delete_domain(domain).await
    }

    pub async fn clear_all(&self) -> KnowledgeResult<u64> {
        self.store.clear_all().await
    }
}
