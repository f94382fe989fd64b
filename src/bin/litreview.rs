//! Litreview CLI: search Scopus, enrich each paper, export a CSV table.
//!
//! Usage:
//!   litreview <KEYWORD> [-n count] [-o output.csv] [-s SUBJECT] [-c concurrency]
//!   litreview <KEYWORD> --input saved.json --skip-enrichment

use clap::{ArgAction, Parser};
use litreview::config::{ELSEVIER_API_KEY_VAR, OPENAI_API_KEY_VAR};
use litreview::{conduct_review, Config, Credentials, ReviewRequest, RunSummary, SearchQuery};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "litreview",
    version,
    about = "Search Scopus and export an enriched literature table"
)]
struct Cli {
    /// Keyword to search titles, abstracts and keywords for
    keyword: String,

    /// Number of papers to request
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Subject area code (e.g. AGRI, BIOC, MEDI)
    #[arg(short, long)]
    subject: Option<String>,

    /// Maximum enrichment calls in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Model used for enrichment
    #[arg(long)]
    model: Option<String>,

    /// Upper bound on each enrichment answer
    #[arg(long)]
    max_tokens: Option<u32>,

    /// YAML config file (default: <config dir>/litreview/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read a saved search response instead of querying Scopus
    #[arg(long)]
    input: Option<PathBuf>,

    /// Save the raw search response to this file
    #[arg(long)]
    save_search: Option<PathBuf>,

    /// Export base fields only
    #[arg(long)]
    skip_enrichment: bool,

    #[arg(long, env = ELSEVIER_API_KEY_VAR, hide_env_values = true)]
    elsevier_api_key: Option<String>,

    #[arg(long, env = OPENAI_API_KEY_VAR, hide_env_values = true)]
    openai_api_key: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Filter directives for a verbosity level: our own logs at the named level,
/// dependencies one step quieter.
fn filter_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,litreview=info",
        1 => "info,litreview=debug",
        _ => "debug,litreview=trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directives(0))),
        n => EnvFilter::new(filter_directives(n)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults and file first, then flags.
fn build_config(cli: &Cli) -> Result<Config, String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(count) = cli.count {
        config.search.count = count;
    }
    if cli.subject.is_some() {
        config.search.subject = cli.subject.clone();
    }
    if let Some(output) = &cli.output {
        config.pipeline.output = output.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.pipeline.concurrency = concurrency;
    }
    if let Some(model) = &cli.model {
        config.enrichment.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.enrichment.max_tokens = max_tokens;
    }
    Ok(config)
}

fn report(summary: &RunSummary, config: &Config) {
    if summary.degraded > 0 || summary.failed > 0 {
        eprintln!(
            "Warning: {} of {} papers have incomplete enrichment ({} degraded, {} failed)",
            summary.degraded + summary.failed,
            summary.rows,
            summary.degraded,
            summary.failed
        );
    }
    println!("Data exported to {}", config.pipeline.output.display());
}

fn run(cli: Cli) -> i32 {
    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let credentials = Credentials::new(cli.elsevier_api_key.clone(), cli.openai_api_key.clone());

    let query = SearchQuery::from_settings(cli.keyword.as_str(), &config.search);
    let mut request = ReviewRequest::new(query).skip_enrichment(cli.skip_enrichment);
    request.input = cli.input;
    request.save_search = cli.save_search;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    match rt.block_on(conduct_review(&config, &credentials, &request)) {
        Ok(summary) => {
            report(&summary, &config);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    std::process::exit(run(cli));
}
