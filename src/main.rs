// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Pulmo: Chest X-ray Screening Demo
//!
//! Command line front end: runs one image through the same controller the
//! web UI uses and prints the findings.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use pulmo::analysis::{build_classifier, OllamaClassifier};
use pulmo::config::{AppConfig, Backend};
use pulmo::preview::PreviewStore;
use pulmo::render::render_text;
use pulmo::upload::{IncomingFile, UploadSurface};
use pulmo::{Controller, PulmoError, Result, View};

/// Pulmo CLI - Chest X-ray Screening Demo
#[derive(Parser, Debug)]
#[command(name = "pulmo")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Chest X-ray screening demo", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a single image file
    Analyze {
        /// Image to analyze
        path: PathBuf,

        /// Override the configured backend
        #[arg(long, value_parser = ["mock", "ollama"])]
        backend: Option<String>,

        /// Override the simulated delay of the mock backend (milliseconds)
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show classifier backend status
    Status,

    /// Write a default configuration file
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Analyze { path, backend, delay_ms } => {
            run_analyze(config, path, backend, delay_ms, &cli.format).await
        }
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status => run_status(config).await,
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

/// Run one image through the controller and print the outcome
async fn run_analyze(
    mut config: AppConfig,
    path: PathBuf,
    backend: Option<String>,
    delay_ms: Option<u64>,
    format: &str,
) -> Result<()> {
    match backend.as_deref() {
        Some("mock") => config.analysis.backend = Backend::Mock,
        Some("ollama") => config.analysis.backend = Backend::Ollama,
        _ => {}
    }
    if let Some(delay_ms) = delay_ms {
        config.analysis.delay_ms = delay_ms;
    }

    let surface = UploadSurface::new(&config.upload);
    let input = surface
        .accept([IncomingFile::from_path(&path)?])?
        .ok_or_else(|| PulmoError::Config(format!("Nothing to analyze at {:?}", path)))?;

    let previews = Arc::new(PreviewStore::new(&config.preview));
    let controller = Controller::new(build_classifier(&config)?, previews);
    controller.select_input(Some(input))?;

    let Some(handle) = controller.start_analysis() else {
        return Err(PulmoError::AnalysisFailed("analysis did not start".to_string()));
    };
    handle
        .await
        .map_err(|e| PulmoError::AnalysisFailed(format!("analysis task failed: {}", e)))?;

    let snapshot = controller.snapshot();
    if let Some(message) = snapshot.last_error {
        return Err(PulmoError::AnalysisFailed(message));
    }
    let Some(results) = snapshot.results.filter(|_| snapshot.view == View::Done) else {
        return Err(PulmoError::AnalysisFailed("no results produced".to_string()));
    };

    match format {
        "json" => {
            let output = serde_json::json!({
                "path": path.to_string_lossy(),
                "classifier": results.classifier,
                "completed_at": results.completed_at,
                "entries": results.entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("{}", path.display());
            println!("{}", render_text(&results));
            if results.classifier == "mock" {
                println!("\nThese results are simulated for demonstration. Consult a physician for an accurate diagnosis.");
            }
        }
    }

    controller.reset();
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Backend: {:?}", config.analysis.backend);
            println!("  Delay: {} ms", config.analysis.delay_ms);
            println!("  Upload limit: {} bytes", config.upload.max_bytes);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    println!("Pulmo v{} Status", env!("CARGO_PKG_VERSION"));
    println!("==================");

    match config.analysis.backend {
        Backend::Mock => {
            println!("Backend: mock ({} ms simulated delay)", config.analysis.delay_ms);
        }
        Backend::Ollama => {
            let classifier = OllamaClassifier::new(&config.ai_engine)?;
            let client = classifier.client();
            println!("Backend: ollama at {}", client.base_url());

            match client.health_check().await {
                Ok(()) => println!("Ollama: Running"),
                Err(e) => {
                    println!("Ollama: Error - {}", e);
                    return Ok(());
                }
            }

            match client.model_available(classifier.model()).await {
                Ok(true) => println!("Vision model '{}': available", classifier.model()),
                Ok(false) => {
                    warn!("Vision model '{}' not found", classifier.model());
                    println!("Vision model '{}': missing (try: ollama pull {})", classifier.model(), classifier.model());
                }
                Err(e) => println!("Vision model: Error - {}", e),
            }
        }
    }

    Ok(())
}

/// Write a default configuration
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(PulmoError::Config(
            "config.json already exists. Use --force to overwrite".to_string()
        ));
    }

    std::fs::create_dir_all(&target)?;
    AppConfig::default().save(&config_path)?;
    info!("Wrote {:?}", config_path);

    println!("Pulmo initialized in {:?}", target);
    println!("\nNext steps:");
    println!("  1. Try the CLI: pulmo analyze chest.png");
    println!("  2. Start the web UI: pulmo-web --open");

    Ok(())
}
