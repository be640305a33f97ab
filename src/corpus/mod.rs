//! Corpus ingestion
//!
//! Walks a documentation directory, parses scraped JSON records, filters by
//! language, applies the document cleaner, and produces normalized
//! [`Document`]s. Ingestion is all-or-nothing: a file with an unrecognized
//! extension aborts the whole load.

use crate::cleaning::{CleaningReport, DocumentCleaner};
use crate::error::{DocdexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// One cleaned source page, immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub title: String,
    pub source_url: String,
    pub file_path: String,
    pub scrape_id: String,
    /// Cleaning report, present when cleaning was enabled
    pub cleaning_info: Option<CleaningReport>,
}

/// Aggregate ingestion statistics, reported for observability only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadStats {
    /// Records that passed the language filter
    pub total_documents: usize,
    /// Documents the cleaner actually shrank
    pub cleaned_documents: usize,
    /// Sum of per-document reduction percentages
    pub total_reduction_percentage: f64,
}

/// On-disk scraped record shape
#[derive(Debug, Deserialize)]
struct ScrapeRecord {
    #[serde(alias = "markdown", default)]
    content: String,
    #[serde(default)]
    metadata: RecordMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RecordMetadata {
    #[serde(default)]
    language: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "sourceURL", alias = "source_url", default)]
    source_url: String,
    #[serde(rename = "scrapeId", alias = "scrape_id", default)]
    scrape_id: String,
}

/// Loads scraped documentation records from a directory tree
pub struct CorpusLoader {
    language: String,
    cleaner: Option<DocumentCleaner>,
}

impl CorpusLoader {
    /// Create a loader for the given language, optionally with cleaning.
    pub fn new(language: impl Into<String>, enable_cleaning: bool) -> Self {
        Self {
            language: language.into(),
            cleaner: enable_cleaning.then(DocumentCleaner::new),
        }
    }

    /// Recursively load every record under `dir`.
    ///
    /// Fails on the first file without a `.json` extension; skips (does not
    /// fail) records whose metadata language does not match.
    pub fn load(&self, dir: &Path) -> Result<(Vec<Document>, LoadStats)> {
        let mut documents = Vec::new();
        let mut stats = LoadStats::default();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| DocdexError::Io {
                source: e.into(),
                context: format!("Failed to walk corpus directory: {}", dir.display()),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                return Err(DocdexError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }

            let raw = std::fs::read_to_string(path).map_err(|e| DocdexError::Io {
                source: e,
                context: format!("Failed to read corpus file: {}", path.display()),
            })?;

            let record: ScrapeRecord =
                serde_json::from_str(&raw).map_err(|e| DocdexError::Json {
                    source: e,
                    context: format!("Failed to parse corpus record: {}", path.display()),
                })?;

            if record.metadata.language != self.language {
                tracing::debug!(
                    path = %path.display(),
                    language = %record.metadata.language,
                    "Skipping record outside the corpus language"
                );
                continue;
            }

            stats.total_documents += 1;

            let (content, cleaning_info) = match &self.cleaner {
                Some(cleaner) => {
                    let (cleaned, report) = cleaner.clean(&record.content);
                    if report.reduction_percentage > 0.0 {
                        stats.cleaned_documents += 1;
                        stats.total_reduction_percentage += report.reduction_percentage;
                    }
                    (cleaned, Some(report))
                }
                None => (record.content, None),
            };

            documents.push(Document {
                content,
                title: record.metadata.title,
                source_url: record.metadata.source_url,
                file_path: path.display().to_string(),
                scrape_id: record.metadata.scrape_id,
                cleaning_info,
            });
        }

        tracing::info!(
            total = stats.total_documents,
            cleaned = stats.cleaned_documents,
            total_reduction = stats.total_reduction_percentage,
            "Corpus loaded"
        );

        Ok((documents, stats))
    }
}
