//! Rendering of ranked hits for the terminal and for `--json`.

use std::io::{self, Write};

use docsearch_core::config::SearchMode;
use docsearch_core::types::SearchHit;
use docsearch_hybrid::normalize::{min_max_percent, percentages};
use docsearch_hybrid::preview::preview;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RenderedHit {
    pub rank: usize,
    pub filename: String,
    pub source_index: String,
    pub score: f32,
    pub percent: f32,
    pub preview: String,
}

/// How raw scores are turned into percentages.
#[derive(Debug, Clone, Copy)]
pub enum Scale {
    Mode(SearchMode),
    /// Lexical scores have no fixed range; scaled within the batch.
    Lexical,
}

pub fn render(hits: &[SearchHit], scale: Scale, query: &str, preview_chars: usize) -> Vec<RenderedHit> {
    let percents = match scale {
        Scale::Mode(mode) => percentages(mode, hits),
        Scale::Lexical => min_max_percent(&hits.iter().map(|h| h.score).collect::<Vec<_>>()),
    };
    hits.iter()
        .zip(percents)
        .enumerate()
        .map(|(i, (hit, percent))| RenderedHit {
            rank: i + 1,
            filename: hit.filename.clone(),
            source_index: hit.source_index.clone(),
            score: hit.score,
            percent,
            preview: preview(&hit.content, query, preview_chars),
        })
        .collect()
}

pub fn write_text<W: Write>(out: &mut W, rendered: &[RenderedHit]) -> io::Result<()> {
    if rendered.is_empty() {
        return writeln!(out, "No results found.");
    }
    for hit in rendered {
        writeln!(out, "{}. {} [{}] {:.2}%", hit.rank, hit.filename, hit.source_index, hit.percent)?;
        writeln!(out, "   {}", hit.preview.replace('\n', " "))?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, rendered: &[RenderedHit]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, rendered)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(index: &str, score: f32, content: &str) -> SearchHit {
        SearchHit { score, source_index: index.into(), filename: format!("{index}.txt"), content: content.into() }
    }

    #[test]
    fn text_lists_rank_file_index_and_percent() {
        let hits = [hit("manual", 9.0, "prime the pump"), hit("notes", 5.0, "pump notes")];
        let rendered = render(&hits, Scale::Mode(SearchMode::Hybrid), "pump", 200);
        let mut out = Vec::new();
        write_text(&mut out, &rendered).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1. manual.txt [manual] 100.00%\n"));
        assert!(text.contains("2. notes.txt [notes] 0.00%"));
        assert!(text.contains("prime the pump..."));
    }

    #[test]
    fn fanout_uses_the_semantic_scale() {
        let rendered = render(&[hit("a", 1.5, "x")], Scale::Mode(SearchMode::Fanout), "x", 200);
        assert_eq!(rendered[0].percent, 50.0);
    }

    #[test]
    fn empty_result_message() {
        let mut out = Vec::new();
        write_text(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No results found.\n");
    }

    #[test]
    fn json_is_an_array_of_hits() {
        let rendered = render(&[hit("a", 2.0, "body")], Scale::Lexical, "body", 200);
        let mut out = Vec::new();
        write_json(&mut out, &rendered).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["source_index"], "a");
        assert_eq!(parsed[0]["percent"], 100.0);
    }
}
