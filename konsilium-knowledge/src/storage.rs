use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sha2::{Digest, Sha256};
use sqlite_vec::sqlite3_vec_init;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{IndexStats, Segment, SearchHit};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

/// Persistent store of (segment, embedding vector) pairs, partitioned by
/// domain tag. All vectors in one store share a single dimensionality and
/// are compared under cosine distance.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    pool: SqlitePool,
}

impl SegmentStore {
    pub async fn open(db_path: &Path, embedding_dim: Option<usize>) -> KnowledgeResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA cache_size = -64000")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        if let Some(dim) = embedding_dim {
            ensure_vec_table(&pool, dim).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Write segments and their vectors. `segments` and `vectors` must have
    /// equal length. An existing id is replaced; each (segment, vector) pair
    /// is committed in its own transaction, so a concurrent reader sees the
    /// old or the new state of a segment but never half of each.
    pub async fn upsert(&self, segments: &[Segment], vectors: &[Vec<f32>]) -> KnowledgeResult<()> {
        if segments.len() != vectors.len() {
            return Err(KnowledgeError::LengthMismatch {
                segments: segments.len(),
                vectors: vectors.len(),
            });
        }
        if segments.is_empty() {
            return Ok(());
        }

        let dim = match vec_dimension(&self.pool).await? {
            Some(dim) => dim,
            None => {
                let dim = vectors[0].len();
                ensure_vec_table(&self.pool, dim).await?;
                dim
            }
        };

        for (segment, vector) in segments.iter().zip(vectors) {
            if vector.len() != dim {
                return Err(KnowledgeError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }

            let payload = serde_json::to_string(vector)
                .map_err(|e| KnowledgeError::Embedding(format!("vector serialize failed: {e}")))?;

            let mut tx = self.pool.begin().await?;
            sqlx::query(
                r#"INSERT INTO segments (id, domain, source, page, ordinal, content, content_hash, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                   ON CONFLICT(id) DO UPDATE SET
                       domain=excluded.domain,
                       source=excluded.source,
                       page=excluded.page,
                       ordinal=excluded.ordinal,
                       content=excluded.content,
                       content_hash=excluded.content_hash,
                       updated_at=excluded.updated_at"#,
            )
            .bind(&segment.id)
            .bind(&segment.domain)
            .bind(&segment.source)
            .bind(segment.page)
            .bind(segment.ordinal)
            .bind(&segment.content)
            .bind(content_hash(&segment.content))
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

            let (rowid,): (i64,) = sqlx::query_as("SELECT rowid FROM segments WHERE id = ?")
                .bind(&segment.id)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("INSERT OR REPLACE INTO segment_vec(rowid, domain, embedding) VALUES (?, ?, ?)")
                .bind(rowid)
                .bind(&segment.domain)
                .bind(payload)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
        }

        Ok(())
    }

    /// Nearest-neighbor search, most similar first. Ties are broken by
    /// ascending ordinal then id so repeated searches over a fixed store are
    /// identical. An empty store or an unknown domain yields an empty list.
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        domain: Option<&str>,
    ) -> KnowledgeResult<Vec<SearchHit>> {
        debug_assert!(top_k >= 1, "top_k must be at least 1");

        let Some(dim) = vec_dimension(&self.pool).await? else {
            return Ok(Vec::new());
        };
        if query_vector.len() != dim {
            return Err(KnowledgeError::DimensionMismatch {
                expected: dim,
                actual: query_vector.len(),
            });
        }

        let payload = serde_json::to_string(query_vector)
            .map_err(|e| KnowledgeError::Embedding(format!("vector serialize failed: {e}")))?;

        type HitRow = (String, String, String, i64, i64, String, f32);
        let rows: Vec<HitRow> = if let Some(domain) = domain {
            sqlx::query_as(
                r#"SELECT s.id, s.domain, s.source, s.page, s.ordinal, s.content, v.distance
                   FROM segment_vec v
                   JOIN segments s ON s.rowid = v.rowid
                   WHERE v.domain = ? AND v.embedding MATCH ? AND v.k = ?
                   ORDER BY v.distance ASC"#,
            )
            .bind(domain)
            .bind(payload)
            .bind(top_k as i64)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                r#"SELECT s.id, s.domain, s.source, s.page, s.ordinal, s.content, v.distance
                   FROM segment_vec v
                   JOIN segments s ON s.rowid = v.rowid
                   WHERE v.embedding MATCH ? AND v.k = ?
                   ORDER BY v.distance ASC"#,
            )
            .bind(payload)
            .bind(top_k as i64)
            .fetch_all(&self.pool)
            .await?
        };

        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .map(|(id, domain, source, page, ordinal, content, distance)| SearchHit {
                segment: Segment {
                    id,
                    domain,
                    source,
                    page,
                    ordinal,
                    content,
                },
                distance,
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.segment.ordinal.cmp(&b.segment.ordinal))
                .then_with(|| a.segment.id.cmp(&b.segment.id))
        });

        Ok(hits)
    }

    /// Delete every segment of one domain. Returns how many were removed.
    pub async fn delete_domain(&self, domain: &str) -> KnowledgeResult<u64> {
        let rowids: Vec<(i64,)> = sqlx::query_as("SELECT rowid FROM segments WHERE domain = ?")
            .bind(domain)
            .fetch_all(&self.pool)
            .await?;
        self.delete_rowids(&rowids).await?;

        let result = sqlx::query("DELETE FROM segments WHERE domain = ?")
            .bind(domain)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete segments by id. Returns how many were removed.
    pub async fn delete_ids(&self, ids: &[String]) -> KnowledgeResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");

        let sql = format!("SELECT rowid FROM segments WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rowids = query.fetch_all(&self.pool).await?;
        self.delete_rowids(&rowids).await?;

        let sql = format!("DELETE FROM segments WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Wipe the whole index. Destructive; call sites must confirm
    /// explicitly before reaching for this.
    pub async fn clear_all(&self) -> KnowledgeResult<u64> {
        let rowids: Vec<(i64,)> = sqlx::query_as("SELECT rowid FROM segments")
            .fetch_all(&self.pool)
            .await?;
        self.delete_rowids(&rowids).await?;

        let result = sqlx::query("DELETE FROM segments")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> KnowledgeResult<IndexStats> {
        let (total_segments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM segments")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT domain, COUNT(*) FROM segments GROUP BY domain ORDER BY domain")
                .fetch_all(&self.pool)
                .await?;

        Ok(IndexStats {
            total_segments,
            per_domain: rows.into_iter().collect(),
        })
    }

    async fn delete_rowids(&self, rowids: &[(i64,)]) -> KnowledgeResult<()> {
        if rowids.is_empty() || vec_dimension(&self.pool).await?.is_none() {
            return Ok(());
        }
        let placeholders = rowids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("DELETE FROM segment_vec WHERE rowid IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for (rowid,) in rowids {
            query = query.bind(rowid);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }
}

fn init_sqlite_vec_once() -> KnowledgeResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        type SqliteVecInitFn =
            unsafe extern "C" fn(*mut sqlite3, *mut *const i8, *const sqlite3_api_routines) -> i32;

        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteVecInitFn>(
            sqlite3_vec_init as *const (),
        )))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(KnowledgeError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

async fn run_migrations(pool: &SqlitePool) -> KnowledgeResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Dimensionality recorded for this store, if any vectors were ever written.
async fn vec_dimension(pool: &SqlitePool) -> KnowledgeResult<Option<usize>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(value,)| value.parse::<usize>().ok()))
}

/// Create the vector virtual table for `dimension`, or verify the store
/// already uses that dimension. Mixing dimensionalities would make every
/// distance meaningless, so a mismatch is an error, not a migration.
async fn ensure_vec_table(pool: &SqlitePool, dimension: usize) -> KnowledgeResult<()> {
    if let Some(existing) = vec_dimension(pool).await? {
        if existing != dimension {
            return Err(KnowledgeError::DimensionMismatch {
                expected: existing,
                actual: dimension,
            });
        }
        return Ok(());
    }

    let create_sql = format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS segment_vec USING vec0(\
         domain text partition key, \
         embedding float[{dimension}] distance_metric=cosine)"
    );
    sqlx::query(&create_sql).execute(pool).await?;

    sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
        .bind(dimension.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
