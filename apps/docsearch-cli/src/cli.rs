use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docsearch_core::config::SearchMode;

#[derive(Debug, Parser)]
#[command(name = "docsearch", about = "Hybrid lexical + semantic search over a folder of documents")]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration environment (selects config.<env>.toml)
    #[arg(long, global = true, env = "RUST_ENV")]
    pub env: Option<String>,

    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index the documents directory, then open the search shell
    Run(RunArgs),
    /// Index the documents directory or the given files
    Ingest(IngestArgs),
    /// Run a single query and print the ranked hits
    Search(SearchArgs),
    /// Interactive search loop
    Shell,
    /// Delete the index that holds a document
    Delete {
        /// Document file name, e.g. `Manual.pdf`
        filename: String,
    },
    /// Serve the admin HTTP API
    Serve {
        /// Address to listen on (overrides server.bind_addr)
        #[arg(long)]
        bind: Option<String>,
    },
    /// List document indices with their record counts
    Indices,
}

impl Default for Command {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Go straight to the shell without re-indexing
    #[arg(long)]
    pub skip_ingest: bool,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Documents directory (overrides ingest.docs_dir)
    #[arg(long)]
    pub docs_dir: Option<PathBuf>,

    /// Index only these files instead of the whole directory
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    /// Maximum number of results (overrides search.max_results)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// `hybrid` or `fanout` (overrides search.mode)
    #[arg(long)]
    pub mode: Option<SearchMode>,

    /// Minimum hybrid score (overrides search.min_score)
    #[arg(long)]
    pub min_score: Option<f32>,

    /// Plain full-text match against a single index
    #[arg(long, requires = "index")]
    pub lexical: bool,

    /// Index for --lexical
    #[arg(long)]
    pub index: Option<String>,

    /// Print hits as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["docsearch"]).unwrap();
        assert!(matches!(cli.command.unwrap_or_default(), Command::Run(RunArgs { skip_ingest: false })));
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from(["docsearch", "-vv", "search", "bilge pump", "-n", "3", "--mode", "fanout"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Some(Command::Search(args)) = cli.command else { panic!("expected search") };
        assert_eq!(args.query, "bilge pump");
        assert_eq!(args.limit, Some(3));
        assert_eq!(args.mode, Some(SearchMode::Fanout));
    }

    #[test]
    fn lexical_requires_an_index() {
        assert!(Cli::try_parse_from(["docsearch", "search", "x", "--lexical"]).is_err());
        assert!(Cli::try_parse_from(["docsearch", "search", "x", "--lexical", "--index", "manual"]).is_ok());
    }
}
