//! Command-line interface for reelscout.
//!
//! Provides commands for uploading a video, waiting for the highlights
//! artifact the service produces from it, and inspecting configuration.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::adapters::{
    upload_file, ProgressCallback, ServiceClient, TransferError, UploadProgress,
};
use crate::config::{self, ResolvedConfig};
use crate::core::{ArtifactResolver, PollOutcome, ResolutionDriver, ResolverSettings};
use crate::domain::{highlights, ResolvedArtifact, UploadDescriptor, RANDOM_ID_BYTES};
use crate::media::{self, MediaFormat};

/// reelscout - Upload videos and resolve their highlight artifacts
#[derive(Parser, Debug)]
#[command(name = "reelscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a video and wait for its highlights
    Upload {
        /// Path to the video file
        file: PathBuf,

        /// Service base URL (overrides config)
        #[arg(long, env = "REELSCOUT_BASE_URL")]
        base_url: Option<String>,

        /// Content type (derived from the file extension if not given)
        #[arg(long)]
        content_type: Option<String>,

        /// Upload only; skip waiting for the artifact
        #[arg(long)]
        no_wait: bool,

        /// Seconds between poll rounds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Maximum poll rounds (overrides config)
        #[arg(short, long)]
        attempts: Option<u32>,

        /// Print the highlight content once resolved
        #[arg(long)]
        show: bool,
    },

    /// Wait for the highlights of an already-uploaded video
    Resolve {
        /// Source object key from a previous upload
        source_key: String,

        /// Service base URL (overrides config)
        #[arg(long, env = "REELSCOUT_BASE_URL")]
        base_url: Option<String>,

        /// Seconds between poll rounds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Maximum poll rounds (overrides config)
        #[arg(short, long)]
        attempts: Option<u32>,

        /// Print the highlight content once resolved
        #[arg(long)]
        show: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Upload {
                file,
                base_url,
                content_type,
                no_wait,
                interval,
                attempts,
                show,
            } => upload_video(file, base_url, content_type, no_wait, interval, attempts, show).await,
            Commands::Resolve {
                source_key,
                base_url,
                interval,
                attempts,
                show,
            } => resolve_artifact(&source_key, base_url, interval, attempts, show).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Build the service client from configuration
fn build_client(cfg: &ResolvedConfig, override_url: Option<String>) -> Result<ServiceClient> {
    let base_url = match override_url {
        Some(url) => url,
        None => cfg.require_base_url()?.to_string(),
    };
    let timeout = Duration::from_secs(cfg.service.request_timeout_seconds);
    Ok(ServiceClient::new(base_url, timeout)?)
}

/// Resolver settings from config, with CLI overrides applied
fn resolver_settings(cfg: &ResolvedConfig, attempts: Option<u32>) -> ResolverSettings {
    let mut settings = cfg.resolver_settings();
    if let Some(n) = attempts {
        settings.max_attempts = n;
    }
    settings
}

/// Upload a video, then hand off to resolution
async fn upload_video(
    file: PathBuf,
    base_url: Option<String>,
    content_type: Option<String>,
    no_wait: bool,
    interval: Option<u64>,
    attempts: Option<u32>,
    show: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", file.display()))?;

    let content_type = match content_type {
        Some(ct) => ct,
        None => match MediaFormat::from_path(&file) {
            Some(format) => format.content_type().to_string(),
            None => anyhow::bail!(
                "Unrecognized file extension for {}. Supported: {} (or pass --content-type)",
                file.display(),
                media::supported_extensions()
            ),
        },
    };

    // Sanitize the name the same way the service keys it.
    let local = UploadDescriptor::generate(
        &cfg.keys.input_prefix,
        &file_name,
        Utc::now(),
        &Uuid::new_v4().as_bytes()[..RANDOM_ID_BYTES],
    );

    let client = build_client(cfg, base_url)?;

    eprintln!("📤 Requesting upload ticket for: {}", file_name);
    let ticket = client
        .request_upload_ticket(&local.sanitized_name, &content_type)
        .await?;

    // The service's key is authoritative; everything downstream
    // matches against it.
    let descriptor = UploadDescriptor::parse(&ticket.s3_key).with_context(|| {
        format!(
            "Service assigned an unrecognizable object key: {}",
            ticket.s3_key
        )
    })?;

    eprintln!("   Key:    {}", descriptor.source_key);
    eprintln!("   Bucket: {}", ticket.bucket);

    // Ctrl+C flips the flag; the progress callback aborts the body.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_signal.store(true, Ordering::SeqCst);
    });

    let reported = Arc::new(AtomicU64::new(0));
    let progress: ProgressCallback = Arc::new(move |p: UploadProgress| {
        let decile = (p.percent() as u64 / 10) * 10;
        if decile > reported.fetch_max(decile, Ordering::Relaxed) {
            eprintln!("   ⬆️  {}% ({})", decile, format_size(p.bytes_sent));
        }
        !cancel.load(Ordering::SeqCst)
    });

    // No overall timeout on this client: a large body would outlive
    // any sensible request timeout.
    let put_client = reqwest::Client::new();
    let sent = match upload_file(
        &put_client,
        &ticket.presigned_url,
        &file,
        &content_type,
        cfg.limits.max_upload_bytes,
        Some(progress),
    )
    .await
    {
        Ok(sent) => sent,
        Err(TransferError::Cancelled) => {
            eprintln!();
            eprintln!("🛑 Upload cancelled");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    eprintln!("✅ Upload complete ({})", format_size(sent));

    if no_wait {
        println!("{}", descriptor.source_key);
        eprintln!();
        eprintln!(
            "Resolve later with: reelscout resolve {}",
            descriptor.source_key
        );
        return Ok(());
    }

    let settings = resolver_settings(cfg, attempts);
    let interval = Duration::from_secs(interval.unwrap_or(cfg.polling.interval_seconds));
    run_resolution(client, descriptor, settings, interval, show).await
}

/// Resolve the highlights for an existing upload
async fn resolve_artifact(
    source_key: &str,
    base_url: Option<String>,
    interval: Option<u64>,
    attempts: Option<u32>,
    show: bool,
) -> Result<()> {
    let cfg = config::config()?;

    let descriptor = UploadDescriptor::parse(source_key)
        .with_context(|| format!("Unrecognized source key: {}", source_key))?;

    let client = build_client(cfg, base_url)?;
    let settings = resolver_settings(cfg, attempts);
    let interval = Duration::from_secs(interval.unwrap_or(cfg.polling.interval_seconds));

    run_resolution(client, descriptor, settings, interval, show).await
}

/// Drive polling until the session settles, streaming progress
async fn run_resolution(
    client: ServiceClient,
    descriptor: UploadDescriptor,
    settings: ResolverSettings,
    interval: Duration,
    show: bool,
) -> Result<()> {
    let max_attempts = settings.max_attempts;
    let source_key = descriptor.source_key.clone();

    eprintln!();
    eprintln!("🔎 Waiting for highlights of: {}", source_key);
    eprintln!(
        "   Checking every {}s, up to {} attempt(s)",
        interval.as_secs(),
        max_attempts
    );
    eprintln!("   Press Ctrl+C to stop");
    eprintln!();

    let resolver = Arc::new(ArtifactResolver::new(client.clone(), descriptor, settings));
    let driver = ResolutionDriver::new(interval);
    let (mut updates, handle) = driver.start(resolver)?;

    // Set up Ctrl+C handler
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        let _ = stop_tx.send(());
    });

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Some(PollOutcome::Pending { attempts_used, round_error }) => {
                        match round_error {
                            Some(err) => eprintln!(
                                "⚠️  Attempt {}/{}: listing failed: {}",
                                attempts_used, max_attempts, err
                            ),
                            None => eprintln!(
                                "⏳ Attempt {}/{}: not ready yet",
                                attempts_used, max_attempts
                            ),
                        }
                    }
                    Some(PollOutcome::Found(artifact)) => {
                        handle.join().await?;
                        report_found(&client, &artifact, show).await?;
                        return Ok(());
                    }
                    Some(PollOutcome::TimedOut) => {
                        handle.join().await?;
                        eprintln!();
                        eprintln!("⌛ No highlights after {} attempt(s)", max_attempts);
                        eprintln!("   The producer may still be working. Try again with:");
                        eprintln!("   reelscout resolve {}", source_key);
                        std::process::exit(1);
                    }
                    Some(PollOutcome::Skipped) => {}
                    None => return Ok(()),
                }
            }
            _ = &mut stop_rx => {
                eprintln!();
                eprintln!("🛑 Stopping resolution...");
                handle.stop().await?;
                eprintln!("   Resume later with: reelscout resolve {}", source_key);
                return Ok(());
            }
        }
    }
}

/// Print the resolved artifact, optionally fetching its content
async fn report_found(
    client: &ServiceClient,
    artifact: &ResolvedArtifact,
    show: bool,
) -> Result<()> {
    println!();
    println!("✅ Highlights ready!");
    println!("   Key: {}", artifact.key);
    if let Some(url) = &artifact.download_url {
        println!("   Download: {}", url);
    }

    if show {
        match &artifact.download_url {
            Some(url) => {
                eprintln!();
                eprintln!("📄 Fetching highlight content...");
                let raw = client.fetch_document(url).await?;
                println!();
                println!("{}", highlights::render_preview(&raw, 2000));
            }
            None => {
                eprintln!("⚠️  No download URL to fetch content from");
            }
        }
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("  Reelscout Configuration");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Service:");
    println!(
        "  Base URL:        {}",
        cfg.service.base_url.as_deref().unwrap_or("(not set)")
    );
    println!("  Request timeout: {}s", cfg.service.request_timeout_seconds);
    println!();
    println!("Object keys:");
    println!("  Input prefix:  {}", cfg.keys.input_prefix);
    println!("  Result prefix: {}", cfg.keys.result_prefix);
    println!("  Result suffix: {}", cfg.keys.result_suffix);
    println!();
    println!("Polling:");
    println!("  Interval:     {}s", cfg.polling.interval_seconds);
    println!("  Max attempts: {}", cfg.polling.max_attempts);
    println!("  Page size:    {}", cfg.polling.page_size);
    println!();
    println!("Limits:");
    println!("  Max upload size: {}", format_size(cfg.limits.max_upload_bytes));
    println!();
    println!("Supported formats: {}", media::supported_extensions());

    Ok(())
}

/// Format file size in human-readable form
fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
