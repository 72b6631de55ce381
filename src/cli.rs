//! CLI commands implementation.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::config::{load_settings, EngineBackend, Settings};
use crate::engine::{Engines, RemoteAnalyzer, RemoteAnonymizer};
use crate::ocr::{FileKind, TextExtractor};
use crate::pii::PiiPipeline;
use crate::server;

#[derive(Parser)]
#[command(name = "piiguard")]
#[command(about = "PII detection and redaction service")]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },

    /// Detect PII in a local file and print the spans as JSON
    Detect {
        /// File to analyze
        file: PathBuf,
    },

    /// Redact PII in a local file
    Redact {
        /// File to redact
        file: PathBuf,
        /// Output path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check availability of external tools and engines
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (settings, _config) = load_settings(cli.config.as_deref()).await;

    match cli.command {
        Commands::Serve { host, port } => server::serve(&settings, &host, port).await,
        Commands::Detect { file } => detect_file(&settings, &file).await,
        Commands::Redact { file, output } => {
            redact_file(&settings, &file, output.as_deref()).await
        }
        Commands::Check => check(&settings).await,
    }
}

fn build_pipeline(settings: &Settings) -> PiiPipeline {
    let engines = Engines::from_settings(settings);
    PiiPipeline::new(engines.analyzer, engines.anonymizer, &settings.language)
}

fn extract_file(settings: &Settings, file: &Path) -> anyhow::Result<String> {
    let extractor = TextExtractor::new(&settings.ocr_language);
    let kind = FileKind::from_path(file);
    Ok(extractor.extract(file, kind)?)
}

async fn detect_file(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let text = extract_file(settings, file)?;
    let spans = build_pipeline(settings).annotate(&text).await?;

    println!("{}", serde_json::to_string_pretty(&spans)?);
    Ok(())
}

async fn redact_file(
    settings: &Settings,
    file: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let text = extract_file(settings, file)?;
    let redacted = build_pipeline(settings).redact(&text).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &redacted)?;
            println!("Wrote {}", style(path.display()).green());
        }
        None => println!("{}", redacted),
    }
    Ok(())
}

async fn check(settings: &Settings) -> anyhow::Result<()> {
    for (tool, available) in TextExtractor::check_tools() {
        let status = if available {
            style("found").green()
        } else {
            style("missing").red()
        };
        println!("{:<12} {}", tool, status);
    }

    if settings.backend == EngineBackend::Presidio {
        let analyzer = RemoteAnalyzer::new(&settings.analyzer_url);
        let status = if analyzer.is_available().await {
            style("reachable").green()
        } else {
            style("unreachable").red()
        };
        println!("{:<12} {} ({})", "analyzer", status, settings.analyzer_url);

        let anonymizer = RemoteAnonymizer::new(&settings.anonymizer_url);
        let status = if anonymizer.is_available().await {
            style("reachable").green()
        } else {
            style("unreachable").red()
        };
        println!(
            "{:<12} {} ({})",
            "anonymizer", status, settings.anonymizer_url
        );
    }

    Ok(())
}
