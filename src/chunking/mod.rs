//! Chunking
//!
//! Splits cleaned documents into overlapping retrieval units. Splitting is
//! markdown-aware: headings, code-fence ends, horizontal rules, blank lines,
//! newlines and spaces are preferred break points, in that order, before
//! falling back to hard character cuts. Chunks shorter than
//! [`MIN_CHUNK_CHARS`] after trimming never reach an index.

use crate::corpus::Document;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Minimum trimmed chunk length; shorter chunks are discarded
pub const MIN_CHUNK_CHARS: usize = 100;

/// Document metadata inherited by every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub source_url: String,
    pub file_path: String,
}

/// The atomic retrieval unit: a bounded slice of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique id, assigned fresh at chunk time
    pub chunk_id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Recursive markdown-aware text splitter
pub struct MarkdownSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Regex>,
}

impl MarkdownSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        // Boundary preference order; fixed literals, compilation cannot fail.
        let separators = [
            r"\n#{1,6} ",
            r"```\n",
            r"\n\*\*\*+\n",
            r"\n---+\n",
            r"\n___+\n",
            r"\n\n",
            r"\n",
            r" ",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();

        Self {
            chunk_size,
            chunk_overlap,
            separators,
        }
    }

    /// Split `text` into trimmed pieces of at most roughly `chunk_size` chars.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
            .into_iter()
            .map(|piece| piece.trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[Regex]) -> Vec<String> {
        let Some(active) = separators.iter().position(|re| re.is_match(text)) else {
            return self.hard_split(text);
        };
        let rest = &separators[active + 1..];
        let pieces = split_keeping_separator(text, &separators[active]);

        let mut finals = Vec::new();
        let mut mergeable: Vec<String> = Vec::new();
        for piece in pieces {
            if piece.chars().count() <= self.chunk_size {
                mergeable.push(piece);
            } else {
                if !mergeable.is_empty() {
                    finals.extend(self.merge(&mergeable));
                    mergeable.clear();
                }
                if rest.is_empty() {
                    finals.extend(self.hard_split(&piece));
                } else {
                    finals.extend(self.split_with(&piece, rest));
                }
            }
        }
        if !mergeable.is_empty() {
            finals.extend(self.merge(&mergeable));
        }
        finals
    }

    /// Greedily merge small pieces up to `chunk_size`, carrying
    /// `chunk_overlap` chars of shared content into the next chunk.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = piece.chars().count();
            if total + len > self.chunk_size && !current.is_empty() {
                docs.push(current.iter().map(|s| s.as_str()).collect::<String>());
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some(front) => total -= front.chars().count(),
                        None => break,
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }
        if !current.is_empty() {
            docs.push(current.iter().map(|s| s.as_str()).collect::<String>());
        }
        docs
    }

    /// Last resort: fixed character windows with overlap.
    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut out = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}

/// Split at every separator match, attaching the separator to the piece
/// that follows it so headings stay with their section.
fn split_keeping_separator(text: &str, re: &Regex) -> Vec<String> {
    let mut cut_points: Vec<usize> = re
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    cut_points.push(text.len());

    let mut pieces = Vec::new();
    let mut last = 0;
    for cut in cut_points {
        if cut > last {
            pieces.push(text[last..cut].to_string());
        }
        last = cut;
    }
    pieces
}

/// Split documents into chunks, filter out short ones, and assign identity.
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let splitter = MarkdownSplitter::new(chunk_size, chunk_overlap);
    let mut chunks = Vec::new();

    for document in documents {
        for piece in splitter.split(&document.content) {
            if piece.trim().chars().count() < MIN_CHUNK_CHARS {
                continue;
            }
            chunks.push(Chunk {
                chunk_id: Uuid::new_v4().to_string(),
                content: piece,
                metadata: ChunkMetadata {
                    title: document.title.clone(),
                    source_url: document.source_url.clone(),
                    file_path: document.file_path.clone(),
                },
            });
        }
    }

    tracing::debug!(chunks = chunks.len(), "Documents split into chunks");
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content: &str) -> Document {
        Document {
            content: content.to_string(),
            title: "Guide".to_string(),
            source_url: "https://docs.example.com/guide".to_string(),
            file_path: "/corpus/guide.json".to_string(),
            scrape_id: "scrape-1".to_string(),
            cleaning_info: None,
        }
    }

    fn sentence(n: usize) -> String {
        format!("Sentence number {n} provides enough filler words to matter. ").repeat(3)
    }

    #[test]
    fn test_small_document_single_chunk() {
        let doc = document(&sentence(1));
        let chunks = split_documents(&[doc], 1000, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.title, "Guide");
        assert_eq!(
            chunks[0].metadata.source_url,
            "https://docs.example.com/guide"
        );
    }

    #[test]
    fn test_short_chunks_discarded() {
        let doc = document("Too short to survive filtering.");
        let chunks = split_documents(&[doc], 1000, 0);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_min_length_invariant() {
        let body = (1..=12).map(sentence).collect::<Vec<_>>().join("\n\n");
        let doc = document(&body);
        let chunks = split_documents(&[doc], 300, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.trim().chars().count() >= MIN_CHUNK_CHARS);
        }
    }

    #[test]
    fn test_heading_boundaries_preferred() {
        let body = format!(
            "## Installation\n{}\n## Configuration\n{}",
            sentence(1),
            sentence(2)
        );
        let doc = document(&body);
        let chunks = split_documents(&[doc], 300, 0);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("## Installation"));
        assert!(chunks[1].content.starts_with("## Configuration"));
    }

    #[test]
    fn test_hard_cut_overlap() {
        let splitter = MarkdownSplitter::new(50, 10);
        // No separators match, forcing character windows.
        let text: String = "0123456789".repeat(12);
        let pieces = splitter.split(&text);
        assert!(pieces.len() > 1);
        let first: Vec<char> = pieces[0].chars().collect();
        let tail: String = first[40..50].iter().collect();
        assert!(pieces[1].starts_with(&tail));
    }

    #[test]
    fn test_chunk_ids_unique() {
        let body = (1..=8).map(sentence).collect::<Vec<_>>().join("\n\n");
        let doc = document(&body);
        let chunks = split_documents(&[doc], 300, 0);
        let mut ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chunks.len());
    }
}
