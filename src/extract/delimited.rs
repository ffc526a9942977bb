//! Delimited-text (CSV/TSV) extraction with topic-based grouping.
//!
//! Admissions spreadsheets are ingested as CSV/TSV exports, one file per
//! sheet. Rows are grouped into topic chunks: a non-empty first column starts
//! a new topic, and cell values are rendered as `Header: value` lines so the
//! chunk text stays readable for both embedding and lexical matching.

use super::{source_name, Chunk, ChunkMetadata, Extractor};
use crate::error::Result;
use std::path::Path;

/// Topic chunks are flushed once their body grows past this many characters.
const MAX_TOPIC_CHARS: usize = 1000;

/// Rows per chunk when a sheet has no header row.
const ROWS_PER_PLAIN_CHUNK: usize = 10;

/// Extractor for delimited text files (CSV, TSV).
pub struct DelimitedExtractor {
    delimiter: char,
}

impl DelimitedExtractor {
    /// Create an extractor for the given field delimiter.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    fn parse_rows(&self, content: &str) -> Vec<Vec<String>> {
        content
            .lines()
            .map(|line| {
                line.split(self.delimiter)
                    .map(|cell| strip_quotes(cell.trim()).to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|row: &Vec<String>| row.iter().any(|cell| !cell.is_empty()))
            .collect()
    }
}

impl Extractor for DelimitedExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<Chunk>> {
        let content = std::fs::read_to_string(path)?;
        let source = source_name(path);
        let sheet = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());

        let rows = self.parse_rows(&content);
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let metadata = ChunkMetadata::new(source, sheet.clone());
        let headers = &rows[0];
        let has_headers = headers.iter().any(|h| !h.is_empty()) && rows.len() > 1;

        let chunks = if has_headers {
            topic_chunks(&sheet, headers, &rows[1..], &metadata)
        } else {
            plain_chunks(&sheet, &rows, &metadata)
        };

        Ok(chunks)
    }
}

/// Group data rows under topics taken from the first column.
fn topic_chunks(
    sheet: &str,
    headers: &[String],
    rows: &[Vec<String>],
    metadata: &ChunkMetadata,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut topic = sheet.to_string();
    let mut body = format!(
        "Заголовки: {}\n\n",
        headers
            .iter()
            .filter(|h| !h.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );

    let flush = |chunks: &mut Vec<Chunk>, topic: &str, body: &str| {
        if !body.trim().is_empty() {
            chunks.push(Chunk {
                text: format!("## {}\n{}", topic, body),
                metadata: metadata.clone(),
            });
        }
    };

    for row in rows {
        let first = row.first().map(String::as_str).unwrap_or("");
        let start = if !first.is_empty() {
            // New topic: close out the previous one.
            flush(&mut chunks, &topic, &body);
            topic = first.to_string();
            body.clear();
            1
        } else {
            0
        };

        for (header, cell) in headers.iter().zip(row.iter()).skip(start) {
            if !header.is_empty() && !cell.is_empty() {
                body.push_str(&format!("{}: {}\n", header, cell));
            }
        }

        if !body.is_empty() && !body.ends_with("\n\n") {
            body.push('\n');
        }

        if body.len() > MAX_TOPIC_CHARS {
            flush(&mut chunks, &topic, &body);
            body.clear();
        }
    }

    flush(&mut chunks, &topic, &body);
    chunks
}

/// No header row: batch joined rows into fixed-size chunks.
fn plain_chunks(sheet: &str, rows: &[Vec<String>], metadata: &ChunkMetadata) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut text = format!("# {}\n", sheet);
    let mut lines = 0;

    for row in rows {
        let row_text = row
            .iter()
            .filter(|cell| !cell.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if row_text.is_empty() {
            continue;
        }

        text.push_str(&row_text);
        text.push('\n');
        lines += 1;

        if lines >= ROWS_PER_PLAIN_CHUNK {
            chunks.push(Chunk {
                text: std::mem::replace(&mut text, format!("# {} (продолжение)\n", sheet)),
                metadata: metadata.clone(),
            });
            lines = 0;
        }
    }

    if lines > 0 {
        chunks.push(Chunk {
            text,
            metadata: metadata.clone(),
        });
    }

    chunks
}

fn strip_quotes(cell: &str) -> &str {
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_topic_grouping() {
        let file = write_csv(
            "Тема,Вопрос,Ответ\n\
             Документы,Что нужно,Паспорт и аттестат\n\
             ,Куда подавать,В приемную комиссию\n\
             Сроки,Когда,С 20 июня\n",
        );

        let chunks = DelimitedExtractor::new(',').extract(file.path()).unwrap();
        // Header preamble chunk + "Документы" topic + "Сроки" topic.
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].text.contains("Заголовки"));
        assert!(chunks[1].text.starts_with("## Документы"));
        assert!(chunks[1].text.contains("Ответ: Паспорт и аттестат"));
        assert!(chunks[1].text.contains("В приемную комиссию"));
        assert!(chunks[2].text.starts_with("## Сроки"));
    }

    #[test]
    fn test_quoted_cells() {
        let file = write_csv("Тема,Ответ\nЛьготы,\"Квоты, скидки\"\n");
        let chunks = DelimitedExtractor::new(',').extract(file.path()).unwrap();
        let joined: String = chunks.iter().map(|c| c.text.clone()).collect();
        assert!(joined.contains("Квоты, скидки"));
    }

    #[test]
    fn test_empty_file() {
        let file = write_csv("");
        let chunks = DelimitedExtractor::new(',').extract(file.path()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_metadata_carries_sheet_name() {
        let file = write_csv("Тема,Ответ\nОбщежитие,Места есть\n");
        let chunks = DelimitedExtractor::new(',').extract(file.path()).unwrap();
        assert!(!chunks.is_empty());
        let stem = file.path().file_stem().unwrap().to_string_lossy();
        assert_eq!(chunks[0].metadata.section, stem);
    }
}
