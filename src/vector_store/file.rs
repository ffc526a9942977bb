//! Flat-file vector store implementation.
//!
//! The whole collection is persisted as one JSON file under the store
//! directory and rewritten on every mutation. That is deliberate: the
//! admissions knowledge base is a few hundred chunks, and whole-file rewrite
//! keeps reload trivial. It is not an append log.

use super::{rank_records, validate_dimensions, EmbeddedRecord, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// File name of the serialized collection inside the store directory.
const DATA_FILE: &str = "records.json";

/// Result of attempting to load persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No persisted file yet; expected on first run.
    Missing,
    /// Loaded this many records.
    Loaded(usize),
}

/// Vector store persisted to a single JSON file.
pub struct FileVectorStore {
    records: RwLock<Vec<EmbeddedRecord>>,
    dimensions: usize,
    store_dir: PathBuf,
    data_path: PathBuf,
}

impl FileVectorStore {
    /// Create a store rooted at the given directory.
    pub fn new(store_dir: impl AsRef<Path>, dimensions: usize) -> Self {
        let store_dir = store_dir.as_ref().to_path_buf();
        let data_path = store_dir.join(DATA_FILE);
        Self {
            records: RwLock::new(Vec::new()),
            dimensions,
            store_dir,
            data_path,
        }
    }

    /// Path of the serialized collection file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Load the persisted collection, replacing the in-memory one.
    ///
    /// A missing file is reported as [`LoadOutcome::Missing`], not an error;
    /// unreadable or unparsable data is a real error.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let bytes = match tokio::fs::read(&self.data_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Err(e.into()),
        };

        let loaded: Vec<EmbeddedRecord> = serde_json::from_slice(&bytes)?;
        let count = loaded.len();
        *self.records.write().await = loaded;
        Ok(LoadOutcome::Loaded(count))
    }

    /// Persist the current collection as one file.
    pub async fn save(&self) -> Result<()> {
        let records = self.records.read().await;
        self.persist(&records).await
    }

    async fn persist(&self, records: &[EmbeddedRecord]) -> Result<()> {
        tokio::fs::create_dir_all(&self.store_dir).await?;
        let data = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.data_path, data).await?;
        debug!(count = records.len(), path = %self.data_path.display(), "store persisted");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn initialize(&self) -> Result<()> {
        match self.load().await {
            Ok(LoadOutcome::Loaded(count)) => {
                info!(count, path = %self.data_path.display(), "loaded vector store");
            }
            Ok(LoadOutcome::Missing) => {
                debug!(path = %self.data_path.display(), "no persisted store, starting empty");
            }
            Err(e) => {
                // Corrupt data is recoverable by re-ingesting; start empty.
                warn!("failed to load persisted store, resetting to empty: {}", e);
                self.records.write().await.clear();
            }
        }

        tokio::fs::create_dir_all(&self.store_dir).await?;
        Ok(())
    }

    async fn add_items(&self, new_records: Vec<EmbeddedRecord>) -> Result<()> {
        if new_records.is_empty() {
            return Ok(());
        }
        validate_dimensions(&new_records, self.dimensions)?;

        let added = new_records.len();
        let mut records = self.records.write().await;
        let previous_len = records.len();
        records.extend(new_records);

        if let Err(e) = self.persist(&records).await {
            // Disk is authoritative: drop the unsaved tail so memory and file
            // do not silently diverge.
            records.truncate(previous_len);
            return Err(e);
        }

        info!(added, total = records.len(), "added records to vector store");
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;
        if records.is_empty() {
            debug!("search on empty store");
            return Ok(Vec::new());
        }
        Ok(rank_records(&records, query_embedding, k))
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records.write().await;
        records.clear();
        self.persist(&records).await?;
        info!("vector store cleared");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

impl std::fmt::Debug for FileVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileVectorStore")
            .field("dimensions", &self.dimensions)
            .field("data_path", &self.data_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ChunkMetadata;

    fn record(text: &str, embedding: Vec<f32>) -> EmbeddedRecord {
        EmbeddedRecord::new(text.to_string(), embedding, ChunkMetadata::new("test.txt", "test"))
    }

    #[tokio::test]
    async fn test_first_run_is_missing_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().join("store"), 2);

        assert_eq!(store.load().await.unwrap(), LoadOutcome::Missing);
        store.initialize().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path(), 2);
        store.initialize().await.unwrap();

        let records = vec![record("первый", vec![1.0, 0.0]), record("второй", vec![0.0, 1.0])];
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        store.add_items(records).await.unwrap();

        // A fresh instance over the same directory sees identical data.
        let reloaded = FileVectorStore::new(dir.path(), 2);
        assert_eq!(reloaded.load().await.unwrap(), LoadOutcome::Loaded(2));
        let results = reloaded.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, ids[0]);
        assert_eq!(results[0].text, "первый");
        assert_eq!(results[1].id, ids[1]);
    }

    #[tokio::test]
    async fn test_add_empty_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path().join("store"), 2);
        store.initialize().await.unwrap();

        store.add_items(Vec::new()).await.unwrap();
        assert!(!store.data_path().exists());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path(), 2);
        store.initialize().await.unwrap();

        let err = store.add_items(vec![record("bad", vec![1.0, 0.0, 0.0])]).await;
        assert!(err.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path(), 2);
        store.initialize().await.unwrap();

        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path(), 2);
        store.initialize().await.unwrap();

        store
            .add_items(vec![record("x", vec![1.0, 0.0]), record("y", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "x");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::new(dir.path(), 2);
        store.initialize().await.unwrap();
        store.add_items(vec![record("x", vec![1.0, 0.0])]).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let reloaded = FileVectorStore::new(dir.path(), 2);
        assert_eq!(reloaded.load().await.unwrap(), LoadOutcome::Loaded(0));
    }

    #[tokio::test]
    async fn test_corrupt_file_resets_on_initialize() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(DATA_FILE), b"not json").await.unwrap();

        let store = FileVectorStore::new(dir.path(), 2);
        assert!(store.load().await.is_err());
        store.initialize().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
