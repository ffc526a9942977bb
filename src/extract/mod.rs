//! Document-to-chunk extraction for knowledge-base ingestion.
//!
//! Extractors turn a source file into an ordered sequence of text chunks with
//! provenance metadata. Native spreadsheet formats are out of scope; sheets
//! are ingested as CSV/TSV exports.

mod delimited;
mod text;

pub use delimited::DelimitedExtractor;
pub use text::TextExtractor;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A unit of extracted source text, pre-embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Provenance metadata.
    pub metadata: ChunkMetadata,
}

/// Provenance metadata for a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name.
    pub source: String,
    /// Sheet or section name within the source.
    pub section: String,
    /// Open extension map for forward compatibility.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl ChunkMetadata {
    /// Create metadata with a source file name and section title.
    pub fn new(source: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            section: section.into(),
            extra: HashMap::new(),
        }
    }
}

/// Trait for document extractors.
pub trait Extractor: Send + Sync {
    /// Extract ordered chunks from a source file.
    fn extract(&self, path: &Path) -> Result<Vec<Chunk>>;
}

/// Pick an extractor for a file based on its extension.
///
/// Returns None for unsupported extensions; ingestion skips those files.
pub fn extractor_for(path: &Path) -> Option<Box<dyn Extractor>> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "txt" | "md" => Some(Box::new(TextExtractor::new())),
        "csv" => Some(Box::new(DelimitedExtractor::new(','))),
        "tsv" => Some(Box::new(DelimitedExtractor::new('\t'))),
        _ => None,
    }
}

/// File name (without directory) for metadata, lossy for non-UTF-8 names.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_dispatch() {
        assert!(extractor_for(Path::new("data/info.txt")).is_some());
        assert!(extractor_for(Path::new("data/sheet.csv")).is_some());
        assert!(extractor_for(Path::new("data/sheet.TSV")).is_some());
        assert!(extractor_for(Path::new("data/script.xlsx")).is_none());
        assert!(extractor_for(Path::new("data/noext")).is_none());
    }
}
