//! Plain-text file extraction.

use super::{source_name, Chunk, ChunkMetadata, Extractor};
use crate::error::Result;
use std::path::Path;

/// Extractor for plain-text files.
///
/// Sections are separated by blank lines; the first line of a section is
/// treated as its title.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for TextExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<Chunk>> {
        let content = std::fs::read_to_string(path)?;
        let source = source_name(path);

        let mut chunks = Vec::new();
        for (index, section) in split_sections(&content).into_iter().enumerate() {
            let text = section.trim().to_string();
            if text.is_empty() {
                continue;
            }

            let title = text
                .lines()
                .next()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .unwrap_or_else(|| format!("Раздел {}", index + 1));

            chunks.push(Chunk {
                text,
                metadata: ChunkMetadata::new(source.clone(), title),
            });
        }

        Ok(chunks)
    }
}

/// Split text into sections on blank (or whitespace-only) lines.
fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }

    sections
}
