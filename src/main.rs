//! sitemap-harvester main entry point
//!
//! Resolves a sitemap hierarchy into article URLs and, unless `--urls-only`
//! is given, extracts every article into JSON lines or a SQLite database.

use anyhow::Context;
use clap::Parser;
use sitemap_harvester::config::{load_config_with_hash, Config, OutputFormat};
use sitemap_harvester::output::{
    print_report, write_markdown_report, write_url_list, JsonLinesSink, RunReport,
};
use sitemap_harvester::storage::{ArticleStore, SqliteStore};
use sitemap_harvester::{HarvestError, Pipeline, Resolver, Shutdown};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// sitemap-harvester: turns a sitemap index into article records
///
/// Walks the sitemap tree below ROOT_URL, deduplicates the article URLs it
/// finds, and extracts title, author, dates and body text from each page.
#[derive(Parser, Debug)]
#[command(name = "sitemap-harvester")]
#[command(version)]
#[command(about = "Harvests articles from a sitemap hierarchy", long_about = None)]
struct Cli {
    /// URL of the root sitemap or sitemap index
    #[arg(value_name = "ROOT_URL")]
    root_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only resolve the sitemap tree and print article URLs
    #[arg(long)]
    urls_only: bool,

    /// Output format for extracted articles
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (JSON lines or URL list) or SQLite database path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write a markdown summary of the run to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Sitemap documents fetched concurrently
    #[arg(long, value_name = "N")]
    fan_out: Option<usize>,

    /// Articles extracted concurrently
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout stays clean for records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_harvester=info,warn"),
            1 => EnvFilter::new("sitemap_harvester=debug,info"),
            2 => EnvFilter::new("sitemap_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (config, config_hash) = load_effective_config(&cli)?;

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; finishing in-flight work");
                shutdown.trigger();
            }
        });
    }

    let pipeline = Pipeline::from_config(&config, shutdown).context("failed to set up pipeline")?;

    let report = if cli.urls_only {
        handle_urls_only(pipeline.resolver(), &cli.root_url, cli.output.as_deref()).await?
    } else {
        handle_harvest(&pipeline, &cli.root_url, &config, config_hash.as_deref()).await?
    };

    print_report(&report);

    if let Some(path) = config.output.summary_path.as_deref().map(Path::new) {
        write_markdown_report(&report, config_hash.as_deref(), path)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    if report.exceeds_failure_ratio(config.output.max_failure_ratio) {
        tracing::warn!(
            "Failure ratio {:.2} exceeds the configured maximum of {:.2}",
            report.failure_ratio(),
            config.output.max_failure_ratio
        );
        return Ok(ExitCode::from(1));
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(fan_out) = cli.fan_out {
        config.resolver.fan_out = fan_out;
    }
    if let Some(concurrency) = cli.concurrency {
        config.extractor.concurrency = concurrency;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(path) = &cli.output {
        config.output.path = Some(path.display().to_string());
    }
    if let Some(path) = &cli.summary {
        config.output.summary_path = Some(path.display().to_string());
    }

    Ok((config, hash))
}

/// Handles --urls-only: resolves the tree and writes the URL list
async fn handle_urls_only(
    resolver: &Resolver,
    root: &str,
    output: Option<&Path>,
) -> Result<RunReport, HarvestError> {
    let (urls, resolve) = resolver.resolve_all(root).await?;

    match output {
        Some(path) => write_url_list(&mut BufWriter::new(File::create(path)?), &urls)?,
        None => write_url_list(&mut io::stdout().lock(), &urls)?,
    }

    Ok(RunReport {
        discovered: urls.len(),
        cancelled: resolve.cancelled,
        resolve,
        ..RunReport::default()
    })
}

/// Handles the main harvest into the configured sink
async fn handle_harvest(
    pipeline: &Pipeline,
    root: &str,
    config: &Config,
    config_hash: Option<&str>,
) -> anyhow::Result<RunReport> {
    match config.output.format {
        OutputFormat::Jsonl => match &config.output.path {
            Some(path) => {
                let mut sink = JsonLinesSink::create(Path::new(path))
                    .with_context(|| format!("failed to create {}", path))?;
                let report = pipeline.run(root, &mut sink).await?;
                tracing::info!("{} records written to {}", sink.written(), path);
                Ok(report)
            }
            None => {
                let mut sink = JsonLinesSink::new(io::stdout().lock());
                Ok(pipeline.run(root, &mut sink).await?)
            }
        },
        OutputFormat::Sqlite => {
            // Validation rejects sqlite output without a path
            let path = config
                .output
                .path
                .as_deref()
                .context("sqlite output requires a database path")?;
            let mut store = SqliteStore::new(Path::new(path))
                .with_context(|| format!("failed to open database {}", path))?;
            let run_id = store.create_run(root, config_hash)?;
            let report = pipeline.run(root, &mut store).await?;
            store.finish_run(run_id, &report)?;
            tracing::info!("Run {} recorded in {}", run_id, path);
            Ok(report)
        }
    }
}
