//! Vector store abstraction for Abitur.
//!
//! Provides a trait-based interface over the embedded-record collection, with
//! a flat-file backend for the deployed store and an in-memory backend for
//! tests and ephemeral use.

mod file;
mod memory;

pub use file::{FileVectorStore, LoadOutcome};
pub use memory::MemoryVectorStore;

use crate::error::Result;
use crate::extract::ChunkMetadata;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A text chunk with its embedding, as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    /// Unique record ID, stable within one store generation.
    pub id: String,
    /// Text content of this chunk.
    pub text: String,
    /// Embedding vector. Length must match the store's dimensionality.
    pub embedding: Vec<f32>,
    /// Provenance metadata.
    pub metadata: ChunkMetadata,
    /// When this record was indexed.
    #[serde(default = "Utc::now")]
    pub indexed_at: DateTime<Utc>,
}

impl EmbeddedRecord {
    /// Create a new record with a fresh ID.
    pub fn new(text: String, embedding: Vec<f32>, metadata: ChunkMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            embedding,
            metadata,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score. Produced fresh per query, never persisted.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// ID of the matched record.
    pub id: String,
    /// Text content of the matched record.
    pub text: String,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
    /// Provenance metadata of the matched record.
    pub metadata: ChunkMetadata,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Prepare the store for use, loading any persisted state.
    ///
    /// Missing persisted data is the expected first-run state, not an error.
    /// Idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Append records and persist the collection.
    ///
    /// Empty input is a no-op (no disk write). Records whose embedding length
    /// does not match the store's dimensionality are rejected.
    async fn add_items(&self, records: Vec<EmbeddedRecord>) -> Result<()>;

    /// Return at most `k` records ranked by cosine similarity descending.
    ///
    /// An empty store yields an empty result, never an error. Score ties
    /// break by insertion order.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Empty the store and persist the empty state.
    async fn clear(&self) -> Result<()>;

    /// Total number of records.
    async fn count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero norm, so
/// degenerate vectors rank as maximally dissimilar instead of erroring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
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

/// Rank records against a query embedding, shared by the store backends.
///
/// A record with a missing or mismatched embedding scores 0.0 and is logged
/// as a data-integrity warning; one bad record never aborts the search.
pub(crate) fn rank_records(
    records: &[EmbeddedRecord],
    query_embedding: &[f32],
    k: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = records
        .iter()
        .map(|record| {
            if record.embedding.len() != query_embedding.len() {
                warn!(
                    id = %record.id,
                    len = record.embedding.len(),
                    "record embedding missing or mismatched, scoring 0"
                );
            }
            SearchResult {
                id: record.id.clone(),
                text: record.text.clone(),
                score: cosine_similarity(query_embedding, &record.embedding),
                metadata: record.metadata.clone(),
            }
        })
        .collect();

    // Stable sort keeps insertion order for equal scores.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(k);
    results
}

/// Validate that every record matches the store's dimensionality.
pub(crate) fn validate_dimensions(records: &[EmbeddedRecord], dimensions: usize) -> Result<()> {
    for record in records {
        if record.embedding.len() != dimensions {
            return Err(crate::error::AbiturError::VectorStore(format!(
                "record {} has embedding of length {}, store expects {}",
                record.id,
                record.embedding.len(),
                dimensions
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, embedding: Vec<f32>) -> EmbeddedRecord {
        EmbeddedRecord::new(text.to_string(), embedding, ChunkMetadata::new("test.txt", "test"))
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_symmetry() {
        let a = vec![0.3, -0.7, 0.2];
        let b = vec![0.9, 0.1, -0.4];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let zero = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &zero), 0.0);
    }

    #[test]
    fn test_rank_ties_break_by_insertion_order() {
        let records = vec![
            record("first", vec![0.0, 1.0]),
            record("second", vec![0.0, 1.0]),
            record("best", vec![1.0, 0.0]),
        ];
        let results = rank_records(&records, &[1.0, 0.0], 3);
        assert_eq!(results[0].text, "best");
        assert_eq!(results[1].text, "first");
        assert_eq!(results[2].text, "second");
    }

    #[test]
    fn test_rank_bad_record_scores_zero() {
        let records = vec![record("good", vec![1.0, 0.0]), record("bad", vec![])];
        let results = rank_records(&records, &[1.0, 0.0], 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "good");
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn test_validate_dimensions() {
        let records = vec![record("a", vec![1.0, 0.0]), record("b", vec![1.0])];
        assert!(validate_dimensions(&records[..1], 2).is_ok());
        assert!(validate_dimensions(&records, 2).is_err());
    }
}
