//! Round Planner - scheduling and route optimization for window-cleaning rounds
//!
//! Reads request JSON files, plans visits over the horizon and writes the
//! response envelopes as JSON.

mod cli;
mod config;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use handlers::HandlerOutcome;
use services::routing::create_routing_service;
use services::scheduler::Scheduler;
use services::vrp::RouteOptimizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "round-planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Console logs go to stderr; stdout carries the JSON responses
    let json_logs = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    let console_json = json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let console_text = (!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,round_planner=debug".into()),
        ))
        .with(console_json)
        .with(console_text)
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let cli = Cli::parse();

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let routing = create_routing_service(config.valhalla_url.as_deref(), config.estimator)?;
    info!("Routing service: {}", routing.name());

    let scheduler = Scheduler::new(
        Arc::from(routing),
        config.estimator,
        RouteOptimizer::new(config.solver.clone()),
        config.fuel,
    );

    let all_ok = match cli.command {
        Command::Schedule {
            inputs,
            output_dir,
            pretty,
        } => run_schedules(&scheduler, inputs, output_dir, pretty).await?,
        Command::Route { input, pretty } => {
            let payload = read_input(&input).await?;
            let outcome = handlers::route::handle_route(&scheduler, &payload).await;
            println!("{}", render(&outcome, pretty)?);
            outcome.success
        }
    };

    if !all_ok {
        error!("One or more requests failed");
        std::process::exit(1);
    }

    Ok(())
}

/// Plan every input concurrently; outputs keep the input order
async fn run_schedules(
    scheduler: &Scheduler,
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    pretty: bool,
) -> Result<bool> {
    if let Some(dir) = &output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut tasks = Vec::with_capacity(inputs.len());
    for input in inputs {
        let scheduler = scheduler.clone();
        tasks.push(tokio::spawn(async move {
            let payload = read_input(&input).await?;
            info!("Planning {}", input.display());
            let outcome = handlers::schedule::handle_schedule(&scheduler, &payload).await;
            Ok::<_, anyhow::Error>((input, outcome))
        }));
    }

    let mut all_ok = true;
    for task in tasks {
        let (input, outcome) = task.await.context("Schedule task panicked")??;
        let body = render(&outcome, pretty)?;
        all_ok &= outcome.success;

        match &output_dir {
            Some(dir) => {
                let path = dir.join(output_file_name(&input));
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Request {} written to {}", outcome.request_id, path.display());
            }
            None => println!("{}", body),
        }
    }

    Ok(all_ok)
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn render(outcome: &HandlerOutcome, pretty: bool) -> Result<String> {
    let body = if pretty {
        serde_json::to_string_pretty(&outcome.body)?
    } else {
        serde_json::to_string(&outcome.body)?
    };
    Ok(body)
}

fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "request".to_string());
    format!("{}.schedule.json", stem)
}
