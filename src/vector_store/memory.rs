//! In-memory vector store implementation.
//!
//! Useful for testing and ephemeral deployments. Nothing is persisted.

use super::{rank_records, validate_dimensions, EmbeddedRecord, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<Vec<EmbeddedRecord>>,
    dimensions: usize,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dimensions,
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn add_items(&self, new_records: Vec<EmbeddedRecord>) -> Result<()> {
        if new_records.is_empty() {
            return Ok(());
        }
        validate_dimensions(&new_records, self.dimensions)?;
        self.records.write().await.extend(new_records);
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;
        Ok(rank_records(&records, query_embedding, k))
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
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
    async fn test_memory_store_search() {
        let store = MemoryVectorStore::new(3);

        store
            .add_items(vec![
                record("Hello world", vec![1.0, 0.0, 0.0]),
                record("Goodbye world", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].text, "Hello world");

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_bad_dimensions() {
        let store = MemoryVectorStore::new(3);
        assert!(store.add_items(vec![record("bad", vec![1.0])]).await.is_err());
    }
}
