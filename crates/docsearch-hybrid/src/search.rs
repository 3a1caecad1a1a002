//! Query side: index discovery, combined hybrid query, semantic fan-out and
//! single-index lexical search.

use docsearch_core::config::SearchMode;
use docsearch_core::naming::validate_index_name;
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::{sort_by_score, EngineQuery, SearchHit, SearchRequest};
use docsearch_core::{Error, Result};

use crate::{index_manager, HybridSearchEngine};

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub mode: SearchMode,
    pub searched_indices: Vec<String>,
    /// Fan-out only: indices whose query failed and were skipped.
    pub failed_indices: Vec<String>,
}

impl<B: SearchBackend> HybridSearchEngine<B> {
    /// Every index outside the reserved prefix, sorted by name.
    pub fn user_indices(&self) -> Result<Vec<String>> {
        index_manager::user_indices(&self.backend, &self.settings.reserved_prefix)
    }

    pub fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(self.search_detailed(query, max_results)?.hits)
    }

    pub fn search_detailed(&self, query: &str, max_results: usize) -> Result<SearchOutcome> {
        self.search_with_mode(query, max_results, self.settings.mode)
    }

    pub fn search_with_mode(&self, query: &str, max_results: usize, mode: SearchMode) -> Result<SearchOutcome> {
        let vector = self.embedder.embed(query)?;
        let indices = self.user_indices()?;
        let mut outcome = SearchOutcome { mode, searched_indices: indices, ..Default::default() };
        if outcome.searched_indices.is_empty() || max_results == 0 {
            tracing::debug!(mode = %mode, "nothing to search");
            return Ok(outcome);
        }

        match mode {
            SearchMode::Hybrid => {
                outcome.hits = self.hybrid(query, vector, &outcome.searched_indices, max_results)?;
            }
            SearchMode::Fanout => {
                let (hits, failed) = self.fanout(&vector, &outcome.searched_indices, max_results);
                outcome.hits = hits;
                outcome.failed_indices = failed;
            }
        }
        tracing::info!(mode = %mode, indices = outcome.searched_indices.len(), hits = outcome.hits.len(), "search finished");
        Ok(outcome)
    }

    fn hybrid(&self, query: &str, vector: Vec<f32>, indices: &[String], max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query: EngineQuery::Hybrid {
                text: query.to_string(),
                vector,
                lexical_weight: self.settings.lexical_weight,
                phrase_weight: self.settings.phrase_weight,
            },
            size: max_results,
        };
        let min_score = self.settings.min_score;
        let mut hits: Vec<SearchHit> = self
            .backend
            .search(indices, &request)?
            .into_iter()
            .filter(|hit| hit.score >= min_score)
            .map(SearchHit::from_engine)
            .collect();
        sort_by_score(&mut hits);
        hits.truncate(max_results);
        Ok(hits)
    }

    fn fanout(&self, vector: &[f32], indices: &[String], max_results: usize) -> (Vec<SearchHit>, Vec<String>) {
        let request = SearchRequest { query: EngineQuery::Semantic { vector: vector.to_vec() }, size: max_results };
        let mut hits = Vec::new();
        let mut failed = Vec::new();
        for index in indices {
            match self.backend.search(std::slice::from_ref(index), &request) {
                Ok(found) => hits.extend(found.into_iter().map(|mut hit| {
                    hit.index.clone_from(index);
                    SearchHit::from_engine(hit)
                })),
                Err(error) => {
                    tracing::warn!(index = %index, error = %error, "skipping index after failed query");
                    failed.push(index.clone());
                }
            }
        }
        sort_by_score(&mut hits);
        hits.truncate(max_results);
        (hits, failed)
    }

    /// Plain full-text match against a single index.
    pub fn lexical_search(&self, index: &str, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if index.trim().is_empty() {
            return Err(Error::MissingParameter("index"));
        }
        validate_index_name(index)?;
        if query.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        if !self.backend.index_exists(index)? {
            return Err(Error::IndexNotFound(index.to_string()));
        }
        let request = SearchRequest { query: EngineQuery::Lexical { text: query.to_string() }, size: max_results };
        let mut hits: Vec<SearchHit> =
            self.backend.search(&[index.to_string()], &request)?.into_iter().map(SearchHit::from_engine).collect();
        sort_by_score(&mut hits);
        Ok(hits)
    }
}
