//! Subcommand implementations. Everything here talks to the engine through
//! one shared blocking client.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use docsearch_core::config::Settings;
use docsearch_core::data_processor::DataProcessor;
use docsearch_core::traits::SearchBackend;
use docsearch_elastic::ElasticClient;
use docsearch_embed::{get_default_embedder, DocumentEmbedder};
use docsearch_hybrid::{remove_index_for, user_indices, HybridSearchEngine, IngestReport, Removal};

use crate::cli::{Command, IngestArgs, RunArgs, SearchArgs};
use crate::output::{self, Scale};
use crate::{admin, shell};

pub fn run(command: Command, mut settings: Settings) -> anyhow::Result<()> {
    let client = Arc::new(
        ElasticClient::connect(&settings.elastic)
            .with_context(|| format!("search engine at {} is not available", settings.elastic.url))?,
    );
    match command {
        Command::Run(args) => run_default(client, &settings, &args),
        Command::Ingest(args) => {
            let engine = build_engine(client, &settings)?;
            ingest(&engine, &mut settings, args)
        }
        Command::Search(args) => {
            if let Some(mode) = args.mode {
                settings.search.mode = mode;
            }
            if let Some(min_score) = args.min_score {
                settings.search.min_score = min_score;
            }
            let engine = build_engine(client, &settings)?;
            search(&engine, &settings, &args)
        }
        Command::Shell => {
            let engine = build_engine(client, &settings)?;
            interactive(&engine, &settings)
        }
        Command::Delete { filename } => delete(client.as_ref(), &filename),
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind_addr.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            // `client` outlives the runtime so the blocking client is dropped outside it.
            runtime.block_on(admin::serve(Arc::clone(&client), &bind))?;
            drop(runtime);
            drop(client);
            Ok(())
        }
        Command::Indices => indices(client.as_ref(), &settings.search.reserved_prefix),
    }
}

pub fn build_engine<B: SearchBackend>(backend: B, settings: &Settings) -> anyhow::Result<HybridSearchEngine<B>> {
    let model = get_default_embedder(&settings.embedding).context("failed to load the embedding model")?;
    let embedder = DocumentEmbedder::new(model, &settings.embedding);
    Ok(HybridSearchEngine::new(backend, embedder, settings.search.clone()))
}

fn run_default<B: SearchBackend>(backend: B, settings: &Settings, args: &RunArgs) -> anyhow::Result<()> {
    let engine = build_engine(backend, settings)?;
    if !args.skip_ingest {
        let processor = DataProcessor::from_settings(&settings.ingest);
        let report = engine.index_directory(&processor)?;
        print_report(&report)?;
    }
    interactive(&engine, settings)
}

fn ingest<B: SearchBackend>(engine: &HybridSearchEngine<B>, settings: &mut Settings, args: IngestArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.docs_dir {
        settings.ingest.docs_dir = dir.to_string_lossy().to_string();
    }
    let processor = DataProcessor::from_settings(&settings.ingest);
    let report = if args.files.is_empty() {
        engine.index_directory(&processor)?
    } else {
        engine.index_files(&processor, &args.files)?
    };
    print_report(&report)?;
    if report.indexed.is_empty() && !report.failed.is_empty() {
        bail!("no document could be indexed");
    }
    Ok(())
}

fn print_report(report: &IngestReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for outcome in &report.indexed {
        writeln!(out, "indexed {} -> {} ({} chars)", outcome.filename, outcome.index, outcome.chars)?;
    }
    for failure in &report.failed {
        writeln!(out, "failed  {}: {}", failure.path.display(), failure.error)?;
    }
    writeln!(out, "{} of {} documents indexed", report.indexed.len(), report.total())
}

fn search<B: SearchBackend>(engine: &HybridSearchEngine<B>, settings: &Settings, args: &SearchArgs) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(settings.search.max_results);
    let (hits, scale) = match (&args.index, args.lexical) {
        (Some(index), true) => (engine.lexical_search(index, &args.query, limit)?, Scale::Lexical),
        _ => {
            let outcome = engine.search_detailed(&args.query, limit)?;
            if !outcome.failed_indices.is_empty() {
                tracing::warn!(skipped = ?outcome.failed_indices, "some indices could not be searched");
            }
            (outcome.hits, Scale::Mode(outcome.mode))
        }
    };

    let rendered = output::render(&hits, scale, &args.query, settings.search.preview_chars);
    let mut out = io::stdout().lock();
    if args.json {
        output::write_json(&mut out, &rendered)?;
    } else {
        output::write_text(&mut out, &rendered)?;
    }
    Ok(())
}

fn interactive<B: SearchBackend>(engine: &HybridSearchEngine<B>, settings: &Settings) -> anyhow::Result<()> {
    let max_results = settings.search.max_results;
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    shell::run_shell(stdin.lock(), &mut out, settings.search.preview_chars, |query| {
        engine.search_detailed(query, max_results)
    })
}

fn delete<B: SearchBackend + ?Sized>(backend: &B, filename: &str) -> anyhow::Result<()> {
    match remove_index_for(backend, filename)? {
        Removal::Removed(index) => println!("index '{index}' deleted"),
        Removal::Missing(index) => bail!("index '{index}' not found"),
    }
    Ok(())
}

fn indices<B: SearchBackend + ?Sized>(backend: &B, reserved: &str) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    for name in user_indices(backend, reserved)? {
        writeln!(out, "{name}\t{}", backend.count_documents(&name)?)?;
    }
    Ok(())
}
