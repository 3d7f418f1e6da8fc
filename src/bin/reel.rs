//! reel: Reelgate CLI client
//!
//! Lists models, runs a generation end to end and cancels predictions,
//! either through a running reelgated or with an in-process boundary.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use reelgate::client::{self, HttpBoundary, PollConfig, PredictionBoundary};
use reelgate::format::{format_cost, format_duration, format_elapsed};
use reelgate::types::unix_millis;
use reelgate::{
    Capability, GenerationStatus, ModelCatalog, Orchestrator, ParameterValues, ProxyService,
    ReplicateClient, RetryConfig,
};

/// Reelgate CLI client
#[derive(Parser)]
#[command(name = "reel")]
#[command(version = reelgate::PKG_VERSION)]
#[command(about = "Reelgate video generation client")]
struct Args {
    /// Boundary address. Without it, requests go straight to Replicate
    /// using REPLICATE_API_KEY.
    #[arg(short, long, env = "REELGATED_URL")]
    address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available models
    Models {
        /// Only models that accept an input image
        #[arg(long)]
        image_to_video: bool,
    },

    /// Generate a video and follow it to completion
    Run {
        /// Model identifier (e.g. "google/veo-3")
        model: String,
        /// Parameter as key=value; repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// Seconds between status checks
        #[arg(long, default_value_t = 3)]
        interval: u64,
    },

    /// Cancel a prediction by its remote id
    Cancel {
        /// Prediction id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let catalog = Arc::new(ModelCatalog::with_embedded_seed());

    match args.command {
        Command::Models { image_to_video } => {
            let models: Vec<_> = if image_to_video {
                catalog.by_capability(Capability::ImageToVideo)
            } else {
                catalog.list().iter().collect()
            };
            for model in models {
                println!(
                    "{:<32} {:<22} {}/s  max {}",
                    model.id,
                    model.name,
                    format_cost(Some(model.pricing.amount)),
                    format_duration(Some(f64::from(model.performance.max_duration))),
                );
            }
        }

        Command::Run {
            model,
            params,
            interval,
        } => {
            let boundary = connect(args.address.as_deref())?;
            let orchestrator = Orchestrator::new(catalog, boundary).poll_config(
                PollConfig::new().interval(std::time::Duration::from_secs(interval)),
            );
            let parameters: ParameterValues = params.into_iter().collect();
            let registry = orchestrator.registry().clone();
            let mut updates = registry.subscribe();

            let handle = match orchestrator.start(&model, parameters).await {
                Ok(handle) => handle,
                Err(e) => {
                    eprintln!("error: {}", e.user_message());
                    std::process::exit(1);
                }
            };
            println!("{} submitted as prediction {}", handle.id, handle.prediction_id);

            let id = handle.id;
            let printer = tokio::spawn(async move {
                let mut last = None;
                while updates.changed().await.is_ok() {
                    let state = updates.borrow_and_update().clone();
                    let Some(generation) = state.get(id) else {
                        continue;
                    };
                    if last != Some(generation.status) {
                        last = Some(generation.status);
                        let elapsed = format_elapsed(generation.start_time, unix_millis())
                            .unwrap_or_default();
                        println!("{id}: {} {elapsed}", generation.status);
                    }
                    if !generation.status.is_active() {
                        break;
                    }
                }
            });

            let status = handle.wait().await;
            // The poll task publishes the final state before it returns.
            let _ = printer.await;

            let Some(generation) = registry.get(id) else {
                return Ok(());
            };
            match status {
                GenerationStatus::Completed => {
                    println!("video: {}", generation.video_url.as_deref().unwrap_or("-"));
                    println!("cost: {}", format_cost(generation.cost));
                }
                _ => {
                    if let Some(error) = &generation.error {
                        eprintln!("error: {error}");
                    }
                    std::process::exit(1);
                }
            }
        }

        Command::Cancel { id } => {
            let boundary = connect(args.address.as_deref())?;
            if let Err(e) = client::cancel(boundary.as_ref(), &id).await {
                eprintln!("error: {}", e.user_message());
                std::process::exit(1);
            }
            println!("cancel requested for {id}");
        }
    }

    Ok(())
}

/// Remote boundary if an address is given, otherwise an in-process one.
fn connect(address: Option<&str>) -> reelgate::Result<Arc<dyn PredictionBoundary>> {
    match address {
        Some(address) => Ok(Arc::new(HttpBoundary::new(address)?)),
        None => {
            let provider = ReplicateClient::from_env()?;
            Ok(Arc::new(ProxyService::new(
                Arc::new(provider),
                RetryConfig::default(),
            )))
        }
    }
}

/// Parse `key=value`; the value is read as JSON when it parses, else as a string.
fn parse_param(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
