use clap::Parser;
use docsearch_cli::cli::Cli;
use docsearch_cli::commands;
use docsearch_core::config::Config;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSEARCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match cli.env.as_deref() {
        Some(env) => Config::load_for_env(env)?,
        None => Config::load()?,
    };
    let settings = config.settings()?;
    commands::run(cli.command.unwrap_or_default(), settings)
}
