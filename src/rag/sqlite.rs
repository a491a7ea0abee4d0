//! SQLite-backed fact index.
//!
//! In-process vector store using SQLite for the records and brute-force
//! cosine similarity for search. The collection is append-only; ids are
//! `ids_<n>` where `n` continues from the current collection size.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{NewFact, ScoredFact, StoredFact, VectorStore};
use crate::core::errors::ApiError;
use crate::core::paths::AppPaths;

pub const COLLECTION_NAME: &str = "mini_docs";

/// Inserts are chunked into transactions of this size.
const WRITE_BATCH_SIZE: usize = 5000;

const ID_PREFIX: &str = "ids_";

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS mini_docs (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                url TEXT NOT NULL DEFAULT '',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collection_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        // Collection metadata, written once at creation. The distance
        // metric is fixed for the collection's lifetime.
        for (key, value) in [
            ("description", "Facts scraped from the MiNI faculty website".to_string()),
            ("created", chrono::Utc::now().to_rfc3339()),
            ("distance", "cosine".to_string()),
        ] {
            sqlx::query("INSERT OR IGNORE INTO collection_meta (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(&value)
                .execute(&self.pool)
                .await
                .map_err(ApiError::internal)?;
        }

        Ok(())
    }

    async fn meta_value(&self, key: &str) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM collection_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    /// Embedding-space consistency: the dimension is pinned on first
    /// insert and later inserts must match it.
    async fn check_dimension(&self, dimension: usize) -> Result<(), ApiError> {
        match self.meta_value("dimension").await? {
            Some(stored) => {
                let stored: usize = stored.parse().unwrap_or(0);
                if stored != dimension {
                    return Err(ApiError::Internal(format!(
                        "embedding dimension {} does not match collection dimension {}",
                        dimension, stored
                    )));
                }
            }
            None => {
                sqlx::query("INSERT OR REPLACE INTO collection_meta (key, value) VALUES ('dimension', ?1)")
                    .bind(dimension.to_string())
                    .execute(&self.pool)
                    .await
                    .map_err(ApiError::internal)?;
            }
        }
        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_fact(row: &sqlx::sqlite::SqliteRow) -> StoredFact {
        StoredFact {
            id: row.get("id"),
            text: row.get("document"),
            url: row.get("url"),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add(&self, records: Vec<NewFact>) -> Result<Vec<String>, ApiError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        self.check_dimension(records[0].embedding.len()).await?;

        let offset = self.count().await?;
        let mut assigned = Vec::with_capacity(records.len());

        for (batch_idx, batch) in records.chunks(WRITE_BATCH_SIZE).enumerate() {
            let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

            for (i, record) in batch.iter().enumerate() {
                let seq = offset + batch_idx * WRITE_BATCH_SIZE + i + 1;
                let id = format!("{}{}", ID_PREFIX, seq);
                let blob = Self::serialize_embedding(&record.embedding);

                sqlx::query(
                    "INSERT INTO mini_docs (id, document, url, embedding)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(&id)
                .bind(&record.text)
                .bind(&record.url)
                .bind(&blob)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::internal)?;

                assigned.push(id);
            }

            tx.commit().await.map_err(ApiError::internal)?;
        }

        Ok(assigned)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredFact>, ApiError> {
        let rows = sqlx::query("SELECT id, document, url, embedding FROM mini_docs")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<ScoredFact> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(ScoredFact {
                    fact: Self::row_to_fact(row),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mini_docs")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(dir: &tempfile::TempDir) -> SqliteVectorStore {
        SqliteVectorStore::with_path(dir.path().join("index.db"))
            .await
            .unwrap()
    }

    fn fact(text: &str, embedding: Vec<f32>, url: &str) -> NewFact {
        NewFact {
            text: text.to_string(),
            embedding,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn add_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        let ids = store
            .add(vec![fact("Hello world", vec![1.0, 0.0, 0.0], "https://x")])
            .await
            .unwrap();
        assert_eq!(ids, vec!["ids_1".to_string()]);
        assert_eq!(store.count().await.unwrap(), 1);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fact.text, "Hello world");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn empty_index_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn ids_continue_across_runs() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = test_store(&dir).await;
            let ids = store
                .add(vec![
                    fact("a", vec![1.0, 0.0], "u1"),
                    fact("b", vec![0.0, 1.0], "u2"),
                ])
                .await
                .unwrap();
            assert_eq!(ids, vec!["ids_1".to_string(), "ids_2".to_string()]);
        }

        // Second run against the same collection: ids continue from M.
        let store = test_store(&dir).await;
        let ids = store
            .add(vec![
                fact("c", vec![1.0, 1.0], "u3"),
                fact("d", vec![0.5, 0.5], "u4"),
            ])
            .await
            .unwrap();
        assert_eq!(ids, vec!["ids_3".to_string(), "ids_4".to_string()]);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn results_ranked_most_similar_first_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .add(vec![
                fact("close", vec![0.9, 0.1, 0.0], "u1"),
                fact("closer", vec![1.0, 0.0, 0.0], "u2"),
                fact("far", vec![0.0, 0.0, 1.0], "u3"),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fact.text, "closer");
        assert_eq!(results[1].fact.text, "close");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn round_trip_preserves_source_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .add(vec![fact("unikalna treść", vec![0.2, 0.8, 0.1], "https://x")])
            .await
            .unwrap();

        let results = store.search(&[0.2, 0.8, 0.1], 1).await.unwrap();
        assert_eq!(results[0].fact.url, "https://x");
    }

    #[tokio::test]
    async fn mismatched_dimension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir).await;

        store
            .add(vec![fact("a", vec![1.0, 0.0, 0.0], "u1")])
            .await
            .unwrap();

        let err = store
            .add(vec![fact("b", vec![1.0, 0.0], "u2")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension"));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
