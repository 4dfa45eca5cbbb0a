//! lqip: generate and backfill low-quality image placeholders.
//!
//! Library commands operate on a JSON attachment library and read the uploads
//! location and pipeline settings from `LQIP_*` variables (or `.env`).

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lqip_cli::{mime_from_extension, render_placeholder};
use lqip_core::{AppError, AttachmentId, Config};
use lqip_db::{AttachmentRepository, JsonFileAttachmentRepository};
use lqip_infra::{init_telemetry, report_error, shutdown_telemetry, LogFormat};
use lqip_processing::{FormatDispatcher, PlaceholderTransformer};
use lqip_services::{
    create_sources, resolve_size_argument, MetadataHooks, PlaceholderLookup, PlaceholderService,
};
use lqip_worker::{
    activate, deactivate, BackfillRunner, BackfillWorker, InMemoryJobScheduler, JobScheduler,
    RunOutcome,
};

#[derive(Parser)]
#[command(name = "lqip", about = "Low-quality image placeholder tool")]
struct Cli {
    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a placeholder for a single image file
    Generate {
        /// Path to the image
        file: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
        /// Print a data URI instead of bare base64
        #[arg(long)]
        data_uri: bool,
    },
    /// Run the metadata hook for one attachment and store the result
    Process {
        /// Attachment ID
        id: u64,
        /// Attachment library file
        #[arg(long)]
        library: PathBuf,
    },
    /// Backfill placeholders for every attachment missing one
    Backfill {
        /// Attachment library file
        #[arg(long)]
        library: PathBuf,
        /// Stop after the first run instead of following continuations
        #[arg(long)]
        once: bool,
    },
    /// Print the stored placeholder of an attachment
    Lookup {
        /// Attachment ID
        id: u64,
        /// Attachment library file
        #[arg(long)]
        library: PathBuf,
        /// Size name (default: thumbnail)
        #[arg(long)]
        size: Option<String>,
    },
    /// Count attachments still missing a placeholder
    Status {
        /// Attachment library file
        #[arg(long)]
        library: PathBuf,
    },
}

#[derive(Serialize)]
struct BackfillSummary {
    runs: usize,
    processed: usize,
    remaining: usize,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn open_library(path: &Path) -> anyhow::Result<Arc<JsonFileAttachmentRepository>> {
    let repository = JsonFileAttachmentRepository::open(path)
        .await
        .map_err(|e| anyhow!("Failed to open library {}: {}", path.display(), e))?;
    Ok(Arc::new(repository))
}

fn build_hooks(
    config: &Config,
    repository: Arc<dyn AttachmentRepository>,
) -> anyhow::Result<MetadataHooks> {
    let sources = create_sources(config).context("Failed to configure image sources")?;
    let service = PlaceholderService::new(&config.placeholder, sources);
    Ok(MetadataHooks::new(Arc::new(service), repository))
}

async fn generate(file: &Path, mime: Option<String>, data_uri: bool) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let mime = match mime {
        Some(mime) => mime,
        None => mime_from_extension(file)
            .ok_or_else(|| anyhow!("Cannot guess MIME type of {}, pass --mime", file.display()))?
            .to_string(),
    };

    let dispatcher = FormatDispatcher::new();
    let codec = *dispatcher.codec_for(&mime).map_err(AppError::from)?;

    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let transformer = PlaceholderTransformer::new(&config.placeholder);
    let placeholder = tokio::task::spawn_blocking(move || transformer.generate(&data, &codec))
        .await
        .context("Transform task failed")??;

    println!("{}", render_placeholder(&placeholder, data_uri));
    Ok(())
}

async fn process(id: AttachmentId, library: &Path) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let repository = open_library(library).await?;
    let hooks = build_hooks(&config, repository.clone())?;

    let attachment = repository
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("Attachment {} not found", id))?;
    let metadata = hooks
        .on_update_attachment_metadata(attachment.metadata, id)
        .await;
    repository.update_metadata(id, metadata.clone()).await?;

    print_json(&metadata)
}

async fn backfill(library: &Path, once: bool) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let repository = open_library(library).await?;
    let hooks = build_hooks(&config, repository.clone())?;
    let scheduler: Arc<dyn JobScheduler> = Arc::new(InMemoryJobScheduler::new());
    let hook = config.backfill.hook_name.clone();

    let runner = BackfillRunner::new(
        repository.clone(),
        Arc::new(hooks),
        scheduler.clone(),
        config.backfill.clone(),
    );

    activate(scheduler.as_ref(), &hook).await?;

    let mut runs = 0usize;
    let mut processed = 0usize;
    loop {
        let Some(report) = BackfillWorker::run_due(&runner, scheduler.as_ref()).await? else {
            tokio::time::sleep(config.backfill.poll_interval).await;
            continue;
        };

        runs += 1;
        processed += report.processed;

        match report.outcome {
            RunOutcome::Exhausted => break,
            RunOutcome::Checkpointed { next_run, .. } => {
                if once {
                    deactivate(scheduler.as_ref(), &hook).await?;
                    break;
                }
                tracing::info!(next_run = %next_run, "Waiting for continuation");
            }
        }
    }

    let remaining = repository
        .count_missing_placeholder(&config.backfill.allowed_mime_types)
        .await?;
    print_json(&BackfillSummary {
        runs,
        processed,
        remaining,
    })
}

async fn lookup(id: AttachmentId, library: &Path, size: Option<String>) -> anyhow::Result<()> {
    let repository = open_library(library).await?;
    let lookup = PlaceholderLookup::new(repository);
    let size = resolve_size_argument(size.as_deref());

    match lookup.get_placeholder(id, size).await? {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("No placeholder stored for attachment {} ({})", id, size),
    }
}

async fn status(library: &Path) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let repository = open_library(library).await?;
    let remaining = repository
        .count_missing_placeholder(&config.backfill.allowed_mime_types)
        .await?;
    println!("{}", remaining);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.log_format).map_err(|e| anyhow!("Failed to initialise tracing: {}", e))?;

    let result = match cli.command {
        Commands::Generate {
            file,
            mime,
            data_uri,
        } => generate(&file, mime, data_uri).await,
        Commands::Process { id, library } => process(AttachmentId(id), &library).await,
        Commands::Backfill { library, once } => backfill(&library, once).await,
        Commands::Lookup { id, library, size } => {
            lookup(AttachmentId(id), &library, size).await
        }
        Commands::Status { library } => status(&library).await,
    };

    if let Err(e) = &result {
        if let Some(app_error) = e.downcast_ref::<AppError>() {
            report_error(app_error, "Command failed");
        }
    }

    shutdown_telemetry().await;
    result
}
