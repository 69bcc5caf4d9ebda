// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lonkero TLS - TLS/DTLS Endpoint Scanner
 * Standalone CLI running the probe orchestrator against one target
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use lonkero_tls::config::{ConfigLoader, ConfigValidator, ScannerConfig};
use lonkero_tls::engine::{PeerProfile, SimulatedPeer};
use lonkero_tls::registry::{ProbeCategory, PROBE_REGISTRY};
use lonkero_tls::types::{ProbeType, ScanDetail};
use lonkero_tls::ScanOrchestrator;

/// Lonkero TLS - TLS/DTLS Endpoint Scanner
#[derive(Parser)]
#[command(name = "lonkero-tls")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Probes a TLS endpoint for versions, suites and known attacks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file path (yaml, toml or json)
    #[arg(short, long, global = true, env = "LONKERO_TLS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one target
    Scan {
        /// Target host name or address
        host: Option<String>,

        /// Target port
        #[arg(short, long)]
        port: Option<u16>,

        /// Connections open at the same time
        #[arg(short, long)]
        threads: Option<usize>,

        /// Probes running at the same time
        #[arg(long)]
        parallel_probes: Option<usize>,

        /// Per-connection response timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Scan detail: quick, normal, detailed, all
        #[arg(long)]
        detail: Option<DetailArg>,

        /// Only run these probes (comma separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Run against a built-in simulated peer (modern, legacy, dtls)
        #[arg(long)]
        simulate: Option<String>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List available probes
    Probes,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DetailArg {
    Quick,
    Normal,
    Detailed,
    All,
}

impl From<DetailArg> for ScanDetail {
    fn from(detail: DetailArg) -> Self {
        match detail {
            DetailArg::Quick => ScanDetail::Quick,
            DetailArg::Normal => ScanDetail::Normal,
            DetailArg::Detailed => ScanDetail::Detailed,
            DetailArg::All => ScanDetail::All,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("lonkero-tls")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            host,
            port,
            threads,
            parallel_probes,
            timeout_ms,
            detail,
            only,
            simulate,
            output,
        } => {
            let mut config = match &cli.config {
                Some(path) => ConfigLoader::new(path)?.load_config()?,
                None => {
                    let mut config = ScannerConfig::default();
                    ConfigLoader::apply_env_overrides(&mut config)?;
                    config
                }
            };

            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(threads) = threads {
                config.overall_threads = threads;
            }
            if let Some(parallel) = parallel_probes {
                config.parallel_probes = parallel;
            }
            if let Some(timeout) = timeout_ms {
                config.timeout_ms = timeout;
            }
            if let Some(detail) = detail {
                config.scan_detail = detail.into();
            }
            if !only.is_empty() {
                let probes = only
                    .iter()
                    .map(|name| name.trim().parse::<ProbeType>().map_err(|e| anyhow::anyhow!(e)))
                    .collect::<Result<Vec<_>>>()
                    .context("Invalid --only value")?;
                config.probes = Some(probes);
            }
            ConfigValidator::validate_scanner_config(&config)?;

            let Some(profile) = simulate else {
                anyhow::bail!(
                    "No protocol engine is linked into this build; run with --simulate <modern|legacy|dtls>"
                );
            };
            let profile: PeerProfile = profile.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            warn!(profile = %profile.name, "Scanning a simulated peer");
            let engine = Arc::new(SimulatedPeer::new(profile));

            let orchestrator = ScanOrchestrator::new(config, engine)?;
            let abort = orchestrator.abort_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing running probes");
                    abort.abort();
                }
            });

            let started = Instant::now();
            let report = orchestrator.scan().await;
            info!(elapsed_ms = started.elapsed().as_millis(), "Scan complete");

            let json = report.to_json().context("Failed to serialize report")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("Failed to write report to {:?}", path))?;
                    info!(path = ?path, "Report written");
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Commands::Probes => {
            for category in ProbeCategory::ALL {
                let probes = PROBE_REGISTRY.get_by_category(category);
                if probes.is_empty() {
                    continue;
                }
                println!("{}:", category.as_str());
                for meta in probes {
                    let dependencies: Vec<&str> = meta.dependencies.iter().map(|d| d.as_str()).collect();
                    println!(
                        "  {:<20} {:<36} {:<9} {}",
                        meta.probe_type.as_str(),
                        meta.display_name,
                        format!("{:?}", meta.risk_level),
                        if dependencies.is_empty() {
                            "-".to_string()
                        } else {
                            dependencies.join(",")
                        }
                    );
                }
            }
            Ok(())
        }
    }
}
