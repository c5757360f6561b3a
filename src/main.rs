//! smartscan - one-shot storage-device health scan
//!
//! Thin front-end over the [`smartscan`] library: runs a single
//! scan-then-probe cycle against the configured smartctl binary and prints
//! the result mappings as JSON, the way a host agent would consume them.

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smartscan::{Error, Result, ScanConfig, SmartScan};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage-device health scanner driving smartctl
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the smartctl binary
    #[arg(long, env = "SMARTCTL_PATH", default_value = "smartctl")]
    smartctl_path: String,

    /// Bus tags scanned for RAID candidates (repeatable)
    #[arg(long, env = "RAID_SCAN_TYPES", value_delimiter = ',', default_value = "sat")]
    raid_scan_types: Vec<String>,

    /// Worker count per pipeline (defaults to the logical-core count)
    #[arg(long, env = "SCAN_WORKERS")]
    workers: Option<usize>,

    /// Collect verbatim smartctl responses instead of structured records
    #[arg(long, env = "SCAN_RAW")]
    raw: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting smartscan");
    info!("  smartctl: {}", args.smartctl_path);
    info!("  RAID scan types: {}", args.raid_scan_types.join(", "));
    info!("  Raw mode: {}", args.raw);

    let config = ScanConfig {
        smartctl_path: args.smartctl_path.into(),
        raid_scan_types: args.raid_scan_types,
        workers: args.workers,
        ..Default::default()
    };

    let plugin = SmartScan::from_config(config)?;
    let results = plugin.collect(args.raw).await?;

    info!(
        "Scan complete: {} structured, {} raw records",
        results.health.len(),
        results.raw.len()
    );

    let rendered = serde_json::to_string_pretty(&results).map_err(Error::Parse)?;
    println!("{}", rendered);

    Ok(())
}

/// Initialize the tracing subscriber from CLI arguments.
fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
