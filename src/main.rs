//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest page harvester.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::jobs::{job_queue, ExtractionMode, JobRunner, JobSpec, SelectorSpec};
use sumi_harvest::output::{format_job, format_job_list, render_results};
use sumi_harvest::storage::{open_store, JobStore, SqliteJobStore, DEFAULT_LIST_LIMIT};
use sumi_harvest::CrawlController;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a guarded page harvester
///
/// Sumi-Harvest fetches pages for submitted jobs, refuses targets that
/// robots.txt disallows or that resolve to internal addresses, follows
/// same-site pagination, and turns page markup into structured records.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A guarded page harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a job and run it to completion
    Submit {
        /// Page to start from
        url: String,

        /// Extraction mode: auto or explicit (alias: css)
        #[arg(long, default_value = "auto")]
        mode: ExtractionMode,

        /// Field selectors as a JSON object, e.g. '{"title": "h2"}'
        #[arg(long)]
        selectors: Option<String>,

        /// Maximum number of pages to fetch
        #[arg(long, default_value_t = 1)]
        max_pages: u32,

        /// Owner the job is recorded for
        #[arg(long, default_value = "local")]
        owner: String,

        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Run the worker until interrupted, processing jobs still queued
    Work,

    /// List an owner's jobs, newest first
    Jobs {
        #[arg(long, default_value = "local")]
        owner: String,

        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Show one job
    Job { id: String },

    /// Print a job's records as JSON
    Results { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("opening database {}", config.output.database_path))?;

    match cli.command {
        Command::Submit {
            url,
            mode,
            selectors,
            max_pages,
            owner,
            description,
        } => {
            let selectors = selectors
                .as_deref()
                .map(SelectorSpec::from_json)
                .transpose()?;
            let spec = JobSpec {
                url,
                mode,
                selectors,
                max_pages,
                owner,
                description,
            };
            handle_submit(&config, store, spec).await
        }
        Command::Work => handle_work(&config, store).await,
        Command::Jobs { owner, limit } => {
            print!("{}", format_job_list(&store.list_jobs(&owner, limit)?));
            Ok(())
        }
        Command::Job { id } => {
            let job = store
                .get_job(&id)?
                .with_context(|| format!("job {} not found", id))?;
            let count = store.get_results(&id)?.len();
            print!("{}", format_job(&job, Some(count)));
            Ok(())
        }
        Command::Results { id } => {
            let job = store
                .get_job(&id)?
                .with_context(|| format!("job {} not found", id))?;
            let records = store.get_results(&id)?;
            println!("{}", render_results(&job, &records)?);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `submit`: stores the job, runs the worker until idle, prints the outcome
async fn handle_submit(
    config: &Config,
    mut store: SqliteJobStore,
    spec: JobSpec,
) -> anyhow::Result<()> {
    spec.validate()?;
    let job = store.create_job(&spec)?;
    tracing::info!("Submitted job {} for {}", job.id, job.spec.url);

    let store = Arc::new(Mutex::new(store));
    let (queue, receiver) = job_queue();
    queue.enqueue(job.id.clone());

    let controller = Arc::new(CrawlController::new(config)?);
    let mut runner = JobRunner::new(Arc::clone(&store), controller, receiver, config.worker.clone());
    runner.run_until_idle().await;

    let store = store
        .lock()
        .map_err(|_| anyhow::anyhow!("job store lock poisoned"))?;
    let job = store
        .get_job(&job.id)?
        .with_context(|| format!("job {} vanished", job.id))?;
    let records = store.get_results(&job.id)?;

    print!("{}", format_job(&job, Some(records.len())));
    if !records.is_empty() {
        println!("{}", render_results(&job, &records)?);
    }
    Ok(())
}

/// Handles `work`: runs the worker loop until Ctrl-C
async fn handle_work(config: &Config, store: SqliteJobStore) -> anyhow::Result<()> {
    let pending = store.queued_job_ids()?;
    let store = Arc::new(Mutex::new(store));
    let (queue, receiver) = job_queue();

    tracing::info!("Re-queueing {} pending jobs", pending.len());
    for id in pending {
        queue.enqueue(id);
    }

    let controller = Arc::new(CrawlController::new(config)?);
    let runner = JobRunner::new(store, controller, receiver, config.worker.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(runner.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    tracing::info!("Interrupt received, finishing current job");
    let _ = shutdown_tx.send(true);

    let processed = worker.await?;
    drop(queue);
    tracing::info!("Worker stopped after {} jobs", processed);
    Ok(())
}
