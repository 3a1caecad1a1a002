//! Turns extracted documents into one stored record per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docsearch_core::data_processor::{DataProcessor, SourceDocument};
use docsearch_core::naming::index_name_for;
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::DocumentRecord;
use docsearch_core::{Error, ErrorKind, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::index_manager::ensure_fresh_index;
use crate::HybridSearchEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub filename: String,
    pub index: String,
    pub document_id: String,
    pub chars: usize,
}

#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub indexed: Vec<IndexOutcome>,
    pub failed: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.indexed.len() + self.failed.len()
    }
}

impl<B: SearchBackend> HybridSearchEngine<B> {
    /// Store `doc` as the only record of its index.
    ///
    /// The embedding is computed before the index is recreated, so a model
    /// failure leaves the previous version of the document searchable.
    pub fn index_document(&self, doc: &SourceDocument) -> Result<IndexOutcome> {
        let index = index_name_for(&doc.filename)?;
        let embedding = self.embedder.embed(&doc.content)?;
        ensure_fresh_index(&self.backend, &index, &self.schema())?;

        let record = DocumentRecord { filename: doc.filename.clone(), content: doc.content.clone(), embedding };
        let document_id = self.backend.index_document(&index, &record)?;
        let chars = doc.content.chars().count();
        tracing::info!(file = %doc.filename, index = %index, chars, "document indexed");
        Ok(IndexOutcome { filename: doc.filename.clone(), index, document_id, chars })
    }

    pub fn index_file(&self, processor: &DataProcessor, path: &Path) -> Result<IndexOutcome> {
        let doc = processor.load(path)?;
        self.index_document(&doc)
    }

    /// Index every recognised file of the documents directory.
    pub fn index_directory(&self, processor: &DataProcessor) -> Result<IngestReport> {
        let files = processor.list_documents()?;
        if files.is_empty() {
            tracing::warn!(dir = %processor.docs_dir().display(), "no documents to index");
        }
        self.index_files(processor, &files)
    }

    /// Index `files` one by one. A failing file is recorded and the rest
    /// still run; losing the engine altogether aborts the batch.
    pub fn index_files(&self, processor: &DataProcessor, files: &[PathBuf]) -> Result<IngestReport> {
        let pb = self.progress_bar(files.len());
        let mut report = IngestReport::default();
        let mut owners: HashMap<String, String> = HashMap::new();

        for path in files {
            let path = processor.resolve(&path.to_string_lossy());
            let label = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            pb.set_message(label.clone());
            match self.index_file(processor, &path) {
                Ok(outcome) => {
                    if let Some(previous) = owners.insert(outcome.index.clone(), outcome.filename.clone()) {
                        tracing::warn!(index = %outcome.index, replaced = %previous, by = %outcome.filename, "files share an index name; the later one wins");
                    }
                    report.indexed.push(outcome);
                }
                Err(error) if error.kind() == ErrorKind::Connectivity => {
                    pb.abandon_with_message("search engine unreachable");
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(file = %label, error = %error, "failed to index document");
                    report.failed.push(IngestFailure { path: path.clone(), error });
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} indexed, {} failed", report.indexed.len(), report.failed.len()));
        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
