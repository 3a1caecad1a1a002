//! Read-query-print loop.

use std::io::{BufRead, Write};

use docsearch_core::ErrorKind;
use docsearch_hybrid::SearchOutcome;

use crate::output::{self, Scale};

pub const EXIT_KEYWORDS: [&str; 3] = ["sair", "exit", "quit"];

pub fn is_exit(input: &str) -> bool {
    EXIT_KEYWORDS.iter().any(|k| input.eq_ignore_ascii_case(k))
}

/// Read queries from `input` until EOF or an exit keyword. Query errors are
/// printed and the loop continues; losing the engine ends it.
pub fn run_shell<R, W, F>(mut input: R, out: &mut W, preview_chars: usize, mut search: F) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> docsearch_core::Result<SearchOutcome>,
{
    writeln!(out, "Type a query, or one of {} to leave.", EXIT_KEYWORDS.join(", "))?;
    let mut line = String::new();
    loop {
        write!(out, "\nsearch> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            writeln!(out, "Please enter a search term.")?;
            continue;
        }
        if is_exit(query) {
            break;
        }
        match search(query) {
            Ok(outcome) => {
                let rendered = output::render(&outcome.hits, Scale::Mode(outcome.mode), query, preview_chars);
                output::write_text(out, &rendered)?;
                if !outcome.failed_indices.is_empty() {
                    writeln!(out, "(skipped failing indices: {})", outcome.failed_indices.join(", "))?;
                }
            }
            Err(e) if e.kind() == ErrorKind::Connectivity => return Err(e.into()),
            Err(e) => writeln!(out, "Search failed: {e}")?,
        }
    }
    writeln!(out, "Bye.")?;
    Ok(())
}
