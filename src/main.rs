//! HyperSync benchmark CLI

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hypersync_bench::cli::Cli;
use hypersync_bench::config::BenchConfig;
use hypersync_bench::runner::{print_summary, BenchmarkRunner, Plan, RunSettings};
use hypersync_bench::scenarios;
use hypersync_bench::{HttpHeightSource, HypersyncClient};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let informational = matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            let _ = e.print();
            if !informational {
                print_scenarios();
                return ExitCode::from(1);
            }
            return ExitCode::SUCCESS;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = BenchConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.log.level, cli.verbose);

    // Validated before any network access
    let plan = Plan::new(&cli.scenario, cli.modification, cli.bulk)?;

    print_banner();

    let mut client_config = config.client_config();
    if let Some(url) = &cli.url {
        client_config.url = url.clone();
    }
    let height_url = cli
        .height_url
        .clone()
        .unwrap_or_else(|| config.hypersync.height_url.clone());

    let settings = RunSettings {
        window_size: cli.window.unwrap_or(config.benchmark.window_size),
        results_dir: cli
            .results_dir
            .clone()
            .unwrap_or_else(|| config.benchmark.results_dir.clone()),
        show_progress: !cli.no_progress,
        max_blocks_per_request: config.hypersync.max_blocks_per_request,
        decode_in_bulk: config.benchmark.save_data_as_parquet,
    };

    info!("Streaming from {}", client_config.url);
    let client = HypersyncClient::new(client_config).context("Failed to create HyperSync client")?;
    let height = HttpHeightSource::new(&height_url, config.api_token(), config.request_timeout())
        .context("Failed to create height client")?;

    let runner = BenchmarkRunner::new(client, height, settings);
    let summary = runner
        .run(&plan)
        .await
        .with_context(|| format!("Benchmark '{}' failed", plan.scenario().name))?;

    print_summary(&summary);
    Ok(())
}

/// `--verbose` beats `RUST_LOG`, which beats the configured level
fn init_tracing(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║      HYPERSYNC BENCHMARK                             ║".bright_cyan());
    println!("{}", "║      Streaming Throughput & Latency                  ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

fn print_scenarios() {
    eprintln!();
    eprintln!("{}", "Available scenarios:".bright_yellow());
    for scenario in scenarios::all() {
        eprintln!("  {:<28} {}", scenario.name, scenario.description);
    }
}
