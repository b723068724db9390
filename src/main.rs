use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use product_translator::languages::{SUPPORTED_LANGUAGES, display_name};
use product_translator::{
    BatchJob, ConfigSource, Diagnostics, HttpProvider, LocalScheduler, MemoryStore, SettingsFiles,
    TASK_NAME, TickOutcome, Translator, arm_schedule,
};

#[derive(Parser, Debug)]
#[command(
    name = "product-translator",
    version,
    about = "Translate product titles and image alt text with an LLM"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<PathBuf>,

    /// Report file (default: ~/.product-translator/report.json)
    #[arg(long = "report-file", global = true)]
    report_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate one string (reads stdin when TEXT is omitted)
    Translate { text: Option<String> },
    /// Run a single batch tick against a catalog file
    Run {
        #[arg(short = 'c', long = "catalog")]
        catalog: PathBuf,
    },
    /// Schedule the batch task and keep ticking until the backlog is empty
    Serve {
        #[arg(short = 'c', long = "catalog")]
        catalog: PathBuf,
    },
    /// Show last schedule, last error and translation count
    Report,
    /// Show supported target languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    product_translator::logging::init(cli.verbose)?;

    let report_path = cli
        .report_file
        .unwrap_or_else(product_translator::default_report_path);
    let settings = SettingsFiles::new(cli.read_settings);

    match cli.command {
        Command::Translate { text } => translate(&settings, &report_path, text).await,
        Command::Run { catalog } => run_once(settings, &report_path, &catalog).await,
        Command::Serve { catalog } => serve(settings, &report_path, &catalog).await,
        Command::Report => {
            let diagnostics = Diagnostics::persistent(&report_path)?;
            println!("{}", diagnostics.snapshot().render());
            Ok(())
        }
        Command::Languages => {
            for (code, name) in SUPPORTED_LANGUAGES {
                println!("{}\t{}", code, name);
            }
            Ok(())
        }
    }
}

async fn translate(settings: &SettingsFiles, report_path: &Path, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("nothing to translate"));
    }

    let config = settings.load()?;
    let diagnostics = Arc::new(Diagnostics::persistent(report_path)?);
    info!(
        "translating to {} with {}",
        display_name(&config.target_language).unwrap_or(config.target_language.as_str()),
        config.provider.kind.as_str()
    );
    let translator = Translator::new(HttpProvider::new()?, config.provider, diagnostics);
    if !translator.is_enabled() {
        warn!("no API key configured; output is the input unchanged");
    }
    println!("{}", translator.translate(text, &config.target_language).await);
    Ok(())
}

fn build_job(
    settings: SettingsFiles,
    report_path: &Path,
    store: Arc<MemoryStore>,
    scheduler: Arc<LocalScheduler>,
) -> Result<(BatchJob<HttpProvider>, Arc<Diagnostics>)> {
    let diagnostics = Arc::new(Diagnostics::persistent(report_path)?);
    let job = BatchJob::new(
        store,
        HttpProvider::new()?,
        scheduler,
        Arc::new(settings),
        diagnostics.clone(),
    );
    Ok((job, diagnostics))
}

async fn run_once(settings: SettingsFiles, report_path: &Path, catalog: &Path) -> Result<()> {
    let store = Arc::new(MemoryStore::load(catalog)?);
    let scheduler = Arc::new(LocalScheduler::new());
    let (job, _) = build_job(settings, report_path, store.clone(), scheduler)?;

    let outcome = job.run().await?;
    store.save(catalog)?;
    println!("{}", describe(outcome));
    Ok(())
}

async fn serve(settings: SettingsFiles, report_path: &Path, catalog: &Path) -> Result<()> {
    let store = Arc::new(MemoryStore::load(catalog)?);
    let scheduler = Arc::new(LocalScheduler::new());
    let (job, diagnostics) = build_job(settings, report_path, store.clone(), scheduler.clone())?;
    arm_schedule(scheduler.as_ref(), &diagnostics, false);

    let job = &job;
    let store = &store;
    let tick = move || async move {
        match job.run().await {
            Ok(outcome) => info!("{}", describe(outcome)),
            Err(err) => error!("tick failed: {:#}", err),
        }
        if let Err(err) = store.save(catalog) {
            error!("failed to save catalog: {:#}", err);
        }
    };

    tokio::select! {
        ticks = scheduler.drive(TASK_NAME, tick) => {
            info!("backlog drained after {} ticks", ticks);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted; stopping");
        }
    }
    Ok(())
}

fn describe(outcome: TickOutcome) -> String {
    match outcome {
        TickOutcome::Busy => "skipped: previous tick still running".to_string(),
        TickOutcome::OutsideWindow => "skipped: outside the translation window".to_string(),
        TickOutcome::HostUnavailable => "skipped: store unavailable".to_string(),
        TickOutcome::Drained => format!("nothing left to translate; {} unscheduled", TASK_NAME),
        TickOutcome::Processed(summary) => format!(
            "processed {} products: {} translated, {} left for retry, {} failed",
            summary.selected, summary.flagged, summary.retry, summary.failed
        ),
    }
}
