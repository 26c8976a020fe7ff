//! TenPay CLI
//!
//! Performs a single signed call against the WeChat Pay V3 API and prints
//! the classified result.

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::ConfigLoader;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tenpay_sdk::client::{ApiRequest, Method};
use tenpay_sdk::signature::ResponseVerifier;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// TenPay CLI - signed requests against the WeChat Pay V3 API
#[derive(Parser, Debug)]
#[command(name = "tenpay-cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TENPAY_CONFIG", default_value = "./tenpay.toml")]
    config: PathBuf,

    /// Override the API base URL (e.g., a sandbox)
    #[arg(long)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one request and print the result as JSON
    Request {
        /// GET, POST, PUT or PATCH
        method: String,
        /// Absolute URL or path relative to the base URL
        url: String,
        /// JSON payload for POST, PUT and PATCH
        #[arg(short, long)]
        data: Option<String>,
        /// Per-request timeout in milliseconds (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting tenpay-cli v{}", env!("CARGO_PKG_VERSION"));

    let loaded = ConfigLoader::new(&args.config, args.base_url)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let verifier: Arc<dyn ResponseVerifier> = match loaded.verifier {
        Some(verifier) => Arc::new(verifier),
        None => {
            tracing::warn!("No platform public key configured, responses will be reported unsigned");
            Arc::new(|_: &str, _: &str, _: &str, _: &str| false)
        }
    };
    let api = ApiRequest::new(loaded.client, Arc::new(loaded.merchant), verifier);

    match args.command {
        Command::Request {
            method,
            url,
            data,
            timeout_ms,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid method {method:?}"))?;
            let payload: Option<Value> = data
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("--data is not valid JSON")?;

            let response = api
                .execute::<Value, Value>(
                    &url,
                    payload.as_ref(),
                    timeout_ms.map(Duration::from_millis),
                    method,
                )
                .await
                .map_err(|e| {
                    tracing::error!("Request failed: {}", e);
                    e
                })?;
            tracing::info!("Request finished: {}", response.result_code);

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
