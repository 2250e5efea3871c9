//! CLI entry point for the KNMI Open Data downloader.

use std::io::{IsTerminal, stdout};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use knmi_dl::defaults::{ANONYMOUS_KEY_PORTAL_URL, OPEN_DATA_BASE_URL, default_date_range};
use knmi_dl::{RunConfig, anonymous_api_key, run};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // Default window: 90 minutes ago until now
    let (default_start, default_end) = default_date_range();
    let start_date = args.start_date.unwrap_or(default_start);
    let end_date = args.end_date.unwrap_or(default_end);

    let http = reqwest::Client::new();
    let api_key = match args.api_key {
        Some(key) => key,
        None => {
            info!("no API key provided, fetching anonymous key from the developer portal");
            anonymous_api_key(&http, ANONYMOUS_KEY_PORTAL_URL)
                .await
                .context("failed to obtain an anonymous API key; pass one with --api-key")?
        }
    };

    // Ctrl-C aborts in-flight transfers; partial files are cleaned up
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling in-flight downloads");
                cancel.cancel();
            }
        });
    }

    let config = RunConfig {
        api_key,
        base_url: OPEN_DATA_BASE_URL.to_string(),
        dataset_name: args.dataset,
        version: args.dataset_version,
        concurrency: usize::from(args.concurrency),
        output_dir: args.output_dir,
        start_date: Some(start_date),
        end_date: Some(end_date),
        limit: args.limit,
        cancel,
        show_progress: !args.quiet && stdout().is_terminal(),
    };

    info!(
        dataset = %config.dataset_name,
        version = %config.version,
        start = %start_date,
        end = %end_date,
        concurrency = config.concurrency,
        "starting download run"
    );

    let stats = run(config).await?;

    println!("{}", stats.render_summary());

    Ok(if stats.failed_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
