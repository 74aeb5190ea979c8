// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Pulmo Web UI
//!
//! Standalone web server for the upload / analyze / results flow.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use pulmo::analysis::build_classifier;
use pulmo::config::{AppConfig, Backend};
use pulmo::Result;

#[derive(Parser, Debug)]
#[command(name = "pulmo-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Pulmo Web UI Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Use the mock classifier regardless of the configured backend
    #[arg(long)]
    mock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open browser automatically
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Pulmo Web UI v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if args.mock {
        config.analysis.backend = Backend::Mock;
    }

    let classifier = build_classifier(&config)?;

    // Open browser if requested
    if args.open {
        let url = format!("http://{}:{}", config.web.host, config.web.port);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    pulmo::web::start_server(config, classifier).await
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from(["pulmo-web", "-H", "0.0.0.0", "-p", "9000", "--mock"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(9000));
        assert!(args.mock);
        assert_eq!(args.config, PathBuf::from("config.json"));
    }
}
