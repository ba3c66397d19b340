//! Vector index with SQLite snapshot persistence.
//!
//! An index snapshot is a single SQLite file holding every vector record
//! plus the identity of the embedding model that produced them. Builds
//! are all-or-nothing: records are embedded and assembled fully in memory,
//! written to a temporary file, and renamed over the target. A failed
//! build never leaves a partial snapshot behind. Loading rejects any
//! snapshot whose embedding identity or dimension disagrees with the
//! active adapter.
//!
//! Once loaded, the `VectorIndex` is immutable and safe to share across
//! concurrent queriers.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, ScoredChunk};
use chrono::{DateTime, Utc};
use passage_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Snapshot-level metadata persisted alongside the records.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMeta {
    /// Identity tag of the embedding model ("provider/model")
    pub embedding_identity: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// When the snapshot was built
    pub created_at: DateTime<Utc>,
}

/// One persisted (vector, text, metadata) record.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// Stable content-derived record id
    pub id: String,

    /// Insertion ordinal; also the tie-break order for equal scores
    pub ordinal: i64,

    /// Source document identifier
    pub document_id: String,

    /// Source page index (0-based)
    pub page_index: u32,

    /// Chunk text
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// Read-only summary of a snapshot, for display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SnapshotStats {
    /// Number of vector records
    pub record_count: usize,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Identity tag of the embedding model
    pub embedding_identity: String,

    /// When the snapshot was built
    pub created_at: DateTime<Utc>,

    /// Snapshot file size in bytes
    pub size_bytes: u64,
}

/// Immutable, in-memory queryable form of a snapshot.
#[derive(Debug)]
pub struct VectorIndex {
    meta: SnapshotMeta,
    records: Vec<VectorRecord>,
}

impl VectorIndex {
    /// Snapshot metadata.
    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the top-k records by cosine similarity to `query_vector`.
    ///
    /// Scores are non-increasing; ties keep insertion order (the sort is
    /// stable). Returns fewer than `k` results when the index is smaller.
    /// Never mutates the index.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, cosine_similarity(query_vector, &record.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let record = &self.records[i];
                ScoredChunk {
                    chunk: Chunk {
                        text: record.text.clone(),
                        document_id: record.document_id.clone(),
                        page_index: record.page_index,
                    },
                    score,
                }
            })
            .collect()
    }
}

/// Embed every chunk and persist a fresh snapshot at `path`.
///
/// Embedding runs in `batch_size` batches; any adapter failure aborts the
/// whole build and the snapshot location is left as it was. An existing
/// snapshot at `path` is replaced atomically.
pub async fn build_index(
    chunks: &[Chunk],
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    path: &Path,
) -> AppResult<VectorIndex> {
    tracing::info!(
        "Building index from {} chunks with '{}' ({} dims)",
        chunks.len(),
        provider.identity(),
        provider.dimensions()
    );

    let mut records = Vec::with_capacity(chunks.len());
    let batch_size = batch_size.max(1);

    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Adapter returned {} embeddings for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        for (chunk, embedding) in batch.iter().zip(embeddings) {
            if embedding.len() != provider.dimensions() {
                return Err(AppError::Embedding(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    embedding.len(),
                    provider.dimensions()
                )));
            }

            let ordinal = records.len() as i64;
            records.push(VectorRecord {
                id: record_id(&chunk.document_id, chunk.page_index, ordinal, &chunk.text),
                ordinal,
                document_id: chunk.document_id.clone(),
                page_index: chunk.page_index,
                text: chunk.text.clone(),
                embedding,
            });
        }
    }

    let meta = SnapshotMeta {
        embedding_identity: provider.identity(),
        dimensions: provider.dimensions(),
        created_at: Utc::now(),
    };

    write_snapshot(path, &meta, &records)?;

    tracing::info!("Persisted snapshot with {} records to {:?}", records.len(), path);

    Ok(VectorIndex { meta, records })
}

/// Open an existing snapshot for querying without re-embedding.
///
/// Fails with `SnapshotNotFound` when no snapshot exists at `path`, and
/// with `SnapshotCorrupt` when the stored embedding identity or dimension
/// does not match the active adapter (or the file is not a readable
/// snapshot).
pub fn load_index(path: &Path, provider: &dyn EmbeddingProvider) -> AppResult<VectorIndex> {
    if !path.exists() {
        return Err(AppError::SnapshotNotFound(path.to_path_buf()));
    }

    let conn = open_snapshot(path)?;
    let meta = read_meta(&conn)?;

    if meta.embedding_identity != provider.identity() {
        return Err(AppError::SnapshotCorrupt(format!(
            "embedding model mismatch: snapshot built with '{}', active adapter is '{}'",
            meta.embedding_identity,
            provider.identity()
        )));
    }

    if meta.dimensions != provider.dimensions() {
        return Err(AppError::SnapshotCorrupt(format!(
            "embedding dimension mismatch: snapshot has {}, active adapter has {}",
            meta.dimensions,
            provider.dimensions()
        )));
    }

    let records = read_records(&conn)?;

    tracing::info!(
        "Loaded snapshot from {:?}: {} records, '{}' ({} dims)",
        path,
        records.len(),
        meta.embedding_identity,
        meta.dimensions
    );

    Ok(VectorIndex { meta, records })
}

/// Read-only summary of the snapshot at `path`.
pub fn snapshot_stats(path: &Path) -> AppResult<SnapshotStats> {
    if !path.exists() {
        return Err(AppError::SnapshotNotFound(path.to_path_buf()));
    }

    let conn = open_snapshot(path)?;
    let meta = read_meta(&conn)?;

    let record_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
        .map_err(|e| AppError::SnapshotCorrupt(format!("Failed to count records: {}", e)))?;

    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Ok(SnapshotStats {
        record_count: record_count as usize,
        dimensions: meta.dimensions,
        embedding_identity: meta.embedding_identity,
        created_at: meta.created_at,
        size_bytes,
    })
}

/// Stable record id derived from the chunk's identity and content.
fn record_id(document_id: &str, page_index: u32, ordinal: i64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(page_index.to_le_bytes());
    hasher.update(ordinal.to_le_bytes());
    hasher.update(text.as_bytes());

    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write the snapshot to a temporary file, then rename it into place.
fn write_snapshot(path: &Path, meta: &SnapshotMeta, records: &[VectorRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("sqlite.tmp");
    let _ = std::fs::remove_file(&tmp_path);

    {
        let mut conn = Connection::open(&tmp_path)
            .map_err(|e| AppError::Serialization(format!("Failed to create snapshot: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE records (
                id TEXT PRIMARY KEY,
                ordinal INTEGER NOT NULL,
                document_id TEXT NOT NULL,
                page_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX idx_records_ordinal ON records(ordinal);
            "#,
        )
        .map_err(|e| AppError::Serialization(format!("Failed to create tables: {}", e)))?;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Serialization(format!("Failed to begin transaction: {}", e)))?;

        for (key, value) in [
            ("embedding_identity", meta.embedding_identity.clone()),
            ("dimensions", meta.dimensions.to_string()),
            ("created_at", meta.created_at.to_rfc3339()),
        ] {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| AppError::Serialization(format!("Failed to write meta: {}", e)))?;
        }

        for record in records {
            tx.execute(
                "INSERT INTO records (id, ordinal, document_id, page_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.ordinal,
                    record.document_id,
                    record.page_index as i64,
                    record.text,
                    embedding_to_bytes(&record.embedding),
                ],
            )
            .map_err(|e| AppError::Serialization(format!("Failed to write record: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Serialization(format!("Failed to commit snapshot: {}", e)))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn open_snapshot(path: &Path) -> AppResult<Connection> {
    Connection::open(path)
        .map_err(|e| AppError::SnapshotCorrupt(format!("Failed to open snapshot: {}", e)))
}

fn read_meta(conn: &Connection) -> AppResult<SnapshotMeta> {
    let read_key = |key: &str| -> AppResult<String> {
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| AppError::SnapshotCorrupt(format!("Missing meta entry '{}': {}", key, e)))
    };

    let embedding_identity = read_key("embedding_identity")?;

    let dimensions: usize = read_key("dimensions")?
        .parse()
        .map_err(|e| AppError::SnapshotCorrupt(format!("Invalid dimensions in meta: {}", e)))?;

    let created_at = DateTime::parse_from_rfc3339(&read_key("created_at")?)
        .map_err(|e| AppError::SnapshotCorrupt(format!("Invalid created_at in meta: {}", e)))?
        .with_timezone(&Utc);

    Ok(SnapshotMeta {
        embedding_identity,
        dimensions,
        created_at,
    })
}

fn read_records(conn: &Connection) -> AppResult<Vec<VectorRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, ordinal, document_id, page_index, text, embedding
             FROM records ORDER BY ordinal",
        )
        .map_err(|e| AppError::SnapshotCorrupt(format!("Failed to read records: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(5)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                embedding_bytes,
            ))
        })
        .map_err(|e| AppError::SnapshotCorrupt(format!("Failed to read records: {}", e)))?;

    let mut records = Vec::new();
    for row in rows {
        let (id, ordinal, document_id, page_index, text, embedding_bytes) =
            row.map_err(|e| AppError::SnapshotCorrupt(format!("Damaged record row: {}", e)))?;

        records.push(VectorRecord {
            id,
            ordinal,
            document_id,
            page_index: page_index as u32,
            text,
            embedding: bytes_to_embedding(&embedding_bytes)?,
        });
    }

    Ok(records)
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::SnapshotCorrupt(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

/// Cosine similarity between two vectors, range [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use tempfile::TempDir;

    fn chunk(document_id: &str, page_index: u32, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            document_id: document_id.to_string(),
            page_index,
        }
    }

    fn test_index(dimensions: usize, embeddings: Vec<Vec<f32>>) -> VectorIndex {
        let records = embeddings
            .into_iter()
            .enumerate()
            .map(|(i, embedding)| VectorRecord {
                id: format!("rec{}", i),
                ordinal: i as i64,
                document_id: "doc".to_string(),
                page_index: 0,
                text: format!("text {}", i),
                embedding,
            })
            .collect();

        VectorIndex {
            meta: SnapshotMeta {
                embedding_identity: "test/test".to_string(),
                dimensions,
                created_at: Utc::now(),
            },
            records,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&a, &[0.0, 1.0, 0.0])).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_query_scores_descending_and_bounded() {
        let index = test_index(
            3,
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.7, 0.7, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![-1.0, 0.0, 0.0],
            ],
        );

        let results = index.query(&[1.0, 0.0, 0.0], 10);
        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].chunk.text, "text 0");

        let limited = index.query(&[1.0, 0.0, 0.0], 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_query_ties_keep_insertion_order() {
        let index = test_index(
            3,
            vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
            ],
        );

        let results = index.query(&[1.0, 0.0, 0.0], 3);
        assert_eq!(results[0].chunk.text, "text 1");
        assert_eq!(results[1].chunk.text, "text 2");
    }

    #[test]
    fn test_query_empty_index() {
        let index = test_index(3, vec![]);
        assert!(index.query(&[1.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_record_id_is_stable_and_content_dependent() {
        let a = record_id("doc.pdf", 0, 0, "some text");
        let b = record_id("doc.pdf", 0, 0, "some text");
        let c = record_id("doc.pdf", 0, 0, "other text");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn test_build_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        let provider = TrigramProvider::new(64);

        let chunks = vec![
            chunk("a.txt", 0, "Causal component analysis studies hidden causes."),
            chunk("a.txt", 1, "Further detail on the method."),
            chunk("b.txt", 0, "Cooking recipes for pasta dishes."),
        ];

        let built = build_index(&chunks, &provider, 2, &path).await.unwrap();
        assert_eq!(built.len(), 3);
        assert!(path.exists());

        let loaded = load_index(&path, &provider).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.meta().embedding_identity, built.meta().embedding_identity);
        assert_eq!(loaded.meta().dimensions, built.meta().dimensions);

        // Round-trip fidelity: the loaded index answers queries exactly
        // like the just-built one
        let query = provider.embed("causal component analysis").await.unwrap();
        let from_built = built.query(&query, 3);
        let from_loaded = loaded.query(&query, 3);

        assert_eq!(from_built.len(), from_loaded.len());
        for (a, b) in from_built.iter().zip(&from_loaded) {
            assert_eq!(a.chunk, b.chunk);
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_build_overwrites_existing_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        let provider = TrigramProvider::new(32);

        build_index(&[chunk("a.txt", 0, "first corpus")], &provider, 10, &path)
            .await
            .unwrap();
        build_index(
            &[
                chunk("b.txt", 0, "second corpus entirely"),
                chunk("b.txt", 1, "with two chunks"),
            ],
            &provider,
            10,
            &path,
        )
        .await
        .unwrap();

        let loaded = load_index(&path, &provider).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_load_missing_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.sqlite");
        let provider = TrigramProvider::new(32);

        let result = load_index(&path, &provider);
        assert!(matches!(result, Err(AppError::SnapshotNotFound(_))));
    }

    #[tokio::test]
    async fn test_load_rejects_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");

        let build_provider = TrigramProvider::new(1536);
        build_index(&[chunk("a.txt", 0, "text")], &build_provider, 10, &path)
            .await
            .unwrap();

        let load_provider = TrigramProvider::new(768);
        let result = load_index(&path, &load_provider);
        assert!(matches!(result, Err(AppError::SnapshotCorrupt(_))));
        assert!(result.unwrap_err().to_string().contains("dimension"));
    }

    #[tokio::test]
    async fn test_load_rejects_unreadable_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        std::fs::write(&path, b"this is not a snapshot").unwrap();

        let provider = TrigramProvider::new(32);
        let result = load_index(&path, &provider);
        assert!(matches!(result, Err(AppError::SnapshotCorrupt(_))));
    }

    #[tokio::test]
    async fn test_snapshot_stats() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        let provider = TrigramProvider::new(48);

        build_index(
            &[chunk("a.txt", 0, "one"), chunk("a.txt", 1, "two")],
            &provider,
            10,
            &path,
        )
        .await
        .unwrap();

        let stats = snapshot_stats(&path).unwrap();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.dimensions, 48);
        assert_eq!(stats.embedding_identity, "trigram/trigram-v1");
        assert!(stats.size_bytes > 0);
    }
}
