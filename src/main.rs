//! `enhancer` command-line entry point.
//!
//! Wires the CLI arguments into a browser session, a locator, and the
//! batch runner, then reports the batch result as JSON on stdout. The
//! exit code reflects the batch outcome: 0 when the run completed, 1
//! when it aborted (bad arguments, launch failure, authentication).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use enhance_flow::{AuthConfig, PipelineConfig, Runner, RunnerConfig};
use enhancer_core_types::{BatchResult, Credentials, EnhancementParams, MediaFile};
use semantic_locator::{IntentLexicon, SemanticLocator};
use session_driver::{EnhanceSession, SessionConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "enhancer",
    version,
    about = "Batch audio enhancement through the provider's web surface"
)]
struct Cli {
    /// Account email; falls back to ENHANCER_EMAIL.
    #[arg(short, long)]
    email: Option<String>,

    /// Account password; falls back to ENHANCER_PASSWORD.
    #[arg(short, long)]
    password: Option<String>,

    /// Input media file, repeatable.
    #[arg(short, long = "file", required = true)]
    files: Vec<PathBuf>,

    /// Directory where enhanced downloads land.
    #[arg(short, long, default_value = "./downloads")]
    download_dir: PathBuf,

    /// Speech enhancement level, 0-100.
    #[arg(long, default_value_t = 70)]
    speech_level: u8,

    /// Background sound level, 0-100.
    #[arg(long, default_value_t = 10)]
    background_level: u8,

    /// Entry URL of the enhancement surface.
    #[arg(long, default_value = "https://podcast.adobe.com/enhance")]
    url: String,

    /// Persistent Chrome profile directory.
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// Run the browser headless.
    #[arg(long)]
    headless: bool,

    /// Explicit Chrome binary path, skipping discovery.
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// JSON file overriding any of the intent keyword sets.
    #[arg(long)]
    lexicon: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ENHANCER_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let credentials = resolve_credentials(&cli)?;
    let mut files = load_files(&cli.files)?;
    let locator = SemanticLocator::new(load_lexicon(cli.lexicon.as_deref())?);

    let defaults = SessionConfig::default();
    let session_config = SessionConfig {
        target_url: cli.url.clone(),
        download_dir: cli.download_dir.clone(),
        profile_dir: cli.profile_dir.clone().unwrap_or(defaults.profile_dir),
        chrome_executable: cli.chrome.clone(),
        headless: cli.headless || defaults.headless,
        nav_timeout: defaults.nav_timeout,
    };
    let runner_config = RunnerConfig {
        auth: AuthConfig {
            target_url: cli.url.clone(),
            ..AuthConfig::default()
        },
        pipeline: PipelineConfig {
            target_url: cli.url.clone(),
            download_dir: cli.download_dir.clone(),
            params: EnhancementParams::clamped(cli.speech_level, cli.background_level),
            ..PipelineConfig::default()
        },
    };

    info!(
        files = files.len(),
        downloads = %cli.download_dir.display(),
        "starting enhancement batch"
    );

    let mut session = EnhanceSession::launch(session_config)
        .await
        .context("browser launch failed")?;

    // The session always gets torn down, whatever the run did.
    let result = {
        let runner = Runner::new(&session, &locator, &runner_config);
        tokio::select! {
            result = runner.run(&credentials, &mut files) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupt received, shutting down");
                BatchResult::failed("interrupted")
            }
        }
    };
    session.close().await;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serializing the batch result")?
    );
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_credentials(cli: &Cli) -> Result<Credentials> {
    let email = cli
        .email
        .clone()
        .or_else(|| std::env::var("ENHANCER_EMAIL").ok());
    let password = cli
        .password
        .clone()
        .or_else(|| std::env::var("ENHANCER_PASSWORD").ok());
    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
        _ => bail!(
            "credentials required: pass --email/--password or set ENHANCER_EMAIL/ENHANCER_PASSWORD"
        ),
    }
}

fn load_files(paths: &[PathBuf]) -> Result<Vec<MediaFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.is_file() {
            bail!("input file not found: {}", path.display());
        }
        files.push(MediaFile::new(path.clone()));
    }
    Ok(files)
}

fn load_lexicon(path: Option<&Path>) -> Result<IntentLexicon> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading lexicon overrides from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing lexicon overrides from {}", path.display()))
        }
        None => Ok(IntentLexicon::default()),
    }
}
