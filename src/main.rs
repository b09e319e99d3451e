//! hcloud-dyndns - Dynamic DNS updater for Hetzner Cloud DNS.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hcloud_dyndns::config::{Config, ConfigFile};
use hcloud_dyndns::providers::HcloudClient;
use hcloud_dyndns::reconciler::{Reconciler, RunReport};
use hcloud_dyndns::resolver::HttpIpResolver;
use hcloud_dyndns::DdnsError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hcloud-dyndns")]
#[command(about = "Dynamic DNS updater for Hetzner Cloud DNS")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile DNS records once (default)
    Update {
        /// Rewrite records even if they already hold the address
        #[arg(short, long)]
        force: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current address and pending changes without applying them
    Status,

    /// Validate configuration
    Validate,

    /// Reconcile repeatedly until interrupted
    Daemon {
        /// Interval between runs in seconds
        #[arg(short, long, default_value = "300")]
        interval: u64,
    },

    /// Print an example configuration
    Example {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    let candidates = [
        Some(PathBuf::from("dyndns.json")),
        Some(PathBuf::from("dyndns.toml")),
        dirs::config_dir().map(|p| p.join("hcloud-dyndns/dyndns.json")),
        Some(PathBuf::from("/etc/hcloud-dyndns/dyndns.json")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from("dyndns.json")
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = get_config_path(cli.config);
    let command = cli.command.unwrap_or(Commands::Update {
        force: false,
        json: false,
    });

    let result = match command {
        Commands::Update { force, json } => cmd_update(&config_path, force, json).await,
        Commands::Status => cmd_status(&config_path).await,
        Commands::Validate => cmd_validate(&config_path),
        Commands::Daemon { interval } => cmd_daemon(&config_path, interval).await,
        Commands::Example { format } => cmd_example(format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            let code = e
                .downcast_ref::<DdnsError>()
                .map(DdnsError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Using config at {}", path.display());
    Config::load_from(path).with_context(|| format!("Loading {}", path.display()))
}

async fn reconcile(config: &Config, force: bool, apply: bool) -> anyhow::Result<RunReport> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let resolver = HttpIpResolver::new(timeout)?;
    let client = HcloudClient::new(&config.api_token, timeout)?;
    let reconciler = Reconciler::new(config, resolver, client).force(force);

    let report = if apply {
        reconciler.run().await?
    } else {
        reconciler.plan().await?
    };
    Ok(report)
}

async fn cmd_update(config_path: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let report = reconcile(&config, force, true).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        tracing::info!(
            "Reconciled {} records, {} changed",
            report.outcomes.len(),
            report.changed()
        );
    }

    Ok(())
}

async fn cmd_status(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let report = reconcile(&config, false, false).await?;

    println!("hcloud-dyndns Status");
    println!("====================\n");

    if report.outcomes.is_empty() {
        println!("No enabled records.");
        return Ok(());
    }

    for outcome in &report.outcomes {
        println!(
            "  {} {} -> {}: {}",
            outcome.record_type, outcome.target, outcome.address, outcome.action
        );
    }

    Ok(())
}

fn cmd_validate(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    for record_type in config.enabled_types() {
        println!(
            "  {}: {} targets, source {}",
            record_type,
            config.targets(record_type).len(),
            config.record(record_type).source
        );
    }

    println!("Configuration is valid.");
    Ok(())
}

async fn cmd_daemon(config_path: &Path, interval: u64) -> anyhow::Result<()> {
    let interval = Duration::from_secs(interval);
    tracing::info!(
        "Starting hcloud-dyndns daemon (interval: {}s)",
        interval.as_secs()
    );

    loop {
        match load_config(config_path) {
            Ok(config) => match reconcile(&config, false, true).await {
                Ok(report) => tracing::info!(
                    "[{}] Reconciled {} records, {} changed",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                    report.outcomes.len(),
                    report.changed()
                ),
                Err(e) => tracing::error!("Run failed: {:#}", e),
            },
            Err(e) => tracing::error!("{:#}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping daemon");
                return Ok(());
            }
        }
    }
}

fn cmd_example(format: Format) -> anyhow::Result<()> {
    let example = ConfigFile::example();
    let rendered = match format {
        Format::Json => example.to_json()?,
        Format::Toml => example.to_toml()?,
    };
    println!("{}", rendered);
    Ok(())
}
