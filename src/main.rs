use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lan_uptime_rs::clock::SystemClock;
use lan_uptime_rs::config::Config;
use lan_uptime_rs::events::ConsoleSink;
use lan_uptime_rs::scanner::NmapScanner;
use lan_uptime_rs::scheduler::{Scheduler, SummaryWriter};
use lan_uptime_rs::watch::WatchCoordinator;
use lan_uptime_rs::{hostlist, offline};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// lan-uptime-rs — host and port uptime watcher driven by periodic nmap scans.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lan-uptime-rs",
    version,
    about = "Host and port uptime watcher driven by periodic grepable nmap scans.",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Watch the hosts from the host list until interrupted.
    Watch {
        /// TOML configuration file. Built-in defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON host list (array of objects with an `ip` key). Overrides the config.
        #[arg(long = "host-list")]
        host_list: Option<PathBuf>,
    },
    /// Convert saved grepable scan output into a JSON record list.
    Parse {
        /// File holding `nmap -oG` output.
        input: PathBuf,

        /// Where to write the JSON records.
        #[arg(long, default_value = "out.json")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lan_uptime_rs=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Watch { config, host_list } => watch(config, host_list).await,
        Command::Parse { input, output } => {
            let count = offline::convert_scan_file(&input, &output).with_context(|| {
                format!("failed to convert {} into {}", input.display(), output.display())
            })?;
            println!("Wrote {} records to {}", count, output.display());
            Ok(())
        }
    }
}

async fn watch(config_path: Option<PathBuf>, host_list: Option<PathBuf>) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(path) = host_list {
        config.watch.host_list = path;
    }

    println!("lan-uptime-rs configuration:");
    println!("  host_list     : {}", config.watch.host_list.display());
    println!("  port          : {}", config.watch.port);
    println!("  scanner       : {} {}", config.scan.program, config.scan.args.join(" "));
    println!("  scan_interval : {}", config.schedule.scan_interval);
    println!("  log_interval  : {}", config.schedule.log_interval);
    println!("  summary       : {}", config.log.summary_path.display());
    println!(
        "  host_log_dir  : {}",
        config
            .log
            .host_log_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<disabled>".to_string())
    );

    let addresses = hostlist::load_host_list(&config.watch.host_list)?;
    info!(hosts = addresses.len(), "loaded host list");

    let sink = Arc::new(ConsoleSink::new(config.log.host_log_dir.clone()));
    let scanner = NmapScanner::new(config.scan.program.clone(), config.scan.args.clone());
    let watch = WatchCoordinator::start(addresses, config.watch.port, scanner, SystemClock, sink)
        .await
        .context("initial scan failed")?;

    let mut scheduler = Scheduler::new(
        watch,
        SummaryWriter::new(config.log.summary_path.clone()),
        config.schedule.scan_interval,
        config.schedule.log_interval,
        Duration::from_millis(config.schedule.tick_millis),
    );

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    info!("watching; press Ctrl+C to stop");
    scheduler.run(cancel).await?;
    info!("watch stopped");
    Ok(())
}
