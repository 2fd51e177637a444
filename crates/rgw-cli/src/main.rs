//! RGW Harness - run a case file against an S3-compatible gateway

use clap::Parser;
use rgw_cli::{load_cases, run_cases, HarnessConfig};
use rgw_client::GatewayClient;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rgw-harness")]
#[command(about = "Run a JSON case file against an S3-compatible RADOS gateway")]
#[command(version)]
struct Args {
    /// INI file with [server] and [user] sections
    #[arg(short, long, default_value = "radosgw.ini", env = "RGW_CONFIG")]
    config: PathBuf,

    /// JSON case file
    #[arg(long, default_value = "radosgw_testcase.json", env = "RGW_CASES")]
    cases: PathBuf,

    /// Emit JSON log lines
    #[arg(long, env = "RGW_LOG_JSON")]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, env = "RGW_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rgw_cli={0},rgw_harness={0},rgw_client={0}", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = HarnessConfig::load(&args.config)?;
    tracing::info!("Gateway: {}", config.server.host);

    let client = GatewayClient::new(config.client_config())?;
    let cases = load_cases(&args.cases)?;
    tracing::info!("Loaded {} cases from {}", cases.len(), args.cases.display());

    let reports = run_cases(&client, &cases).await;
    let failed: Vec<_> = reports.iter().filter(|r| r.is_failure()).collect();
    if !failed.is_empty() {
        let names: Vec<_> = failed
            .iter()
            .map(|r| format!("{} ({})", r.index, r.func_name))
            .collect();
        anyhow::bail!("{} of {} cases failed: {}", failed.len(), reports.len(), names.join(", "));
    }

    tracing::info!("All {} cases ran", reports.len());
    Ok(())
}
