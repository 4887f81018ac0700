//! Workshop runner entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use common::SequentialIds;
use domain::{InMemoryOrderRepository, OrderService};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workshop::{Config, Script};

/// Replay a repair order command script and print the resulting order.
#[derive(Debug, Parser)]
#[command(name = "workshop", version)]
struct Args {
    /// Script file; reads stdin when omitted.
    script: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Log filter, overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = Config::from_env().with_overrides(args.log, args.pretty);

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let script = Script::load(args.script.as_deref())?;
    tracing::info!(commands = script.commands.len(), "running script");

    // Sequential ids so scripts can refer to services and parts they add.
    let service =
        OrderService::new(InMemoryOrderRepository::new()).with_ids(SequentialIds::shared());
    let report = workshop::run(&service, script).await?;

    let output = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{output}");

    if report.has_rejections() {
        tracing::warn!(failures = report.failures.len(), "script finished with rejected commands");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
