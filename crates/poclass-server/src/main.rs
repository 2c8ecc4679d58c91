//! poclass
//!
//! Purchase-order classification service.
//!
//! `poclass serve` exposes the classification cascade over HTTP;
//! `poclass classify` runs it once and prints the result as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

mod config;
mod routes;
mod state;

use config::AppConfig;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "poclass")]
#[command(about = "Purchase-order classification into an L1/L2/L3 taxonomy", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "poclass.yaml", env = "POCLASS_CONFIG")]
    config: String,

    /// Taxonomy file, overriding the configuration
    #[arg(short, long)]
    taxonomy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address
        #[arg(short = 'l', long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short = 'P', long)]
        port: Option<u16>,
    },

    /// Classify a single purchase-order description
    Classify {
        /// Purchase-order description
        #[arg(short, long)]
        description: String,

        /// Supplier name
        #[arg(short, long)]
        supplier: Option<String>,

        /// Skip the language model stage
        #[arg(long)]
        no_llm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(taxonomy) = &cli.taxonomy {
        config.taxonomy_path = taxonomy.into();
    }
    info!("Configuration loaded from {}", cli.config);

    match cli.command {
        Commands::Serve { listen, port } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Commands::Classify {
            description,
            supplier,
            no_llm,
        } => {
            if no_llm {
                config.llm.enabled = false;
            }
            classify_once(config, &description, supplier.as_deref()).await
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("Starting poclass service");

    let metrics_handle = init_metrics()?;

    let state = AppState::from_config(&config, Some(metrics_handle))?;
    info!(
        model = state.cascade.has_model(),
        llm = state.cascade.has_llm(),
        "Classification cascade ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn classify_once(config: AppConfig, description: &str, supplier: Option<&str>) -> Result<()> {
    if description.trim().is_empty() {
        anyhow::bail!("--description must not be empty");
    }

    let state = AppState::from_config(&config, None)?;
    let result = state
        .cascade
        .classify_detailed(description.trim(), supplier)
        .await;
    info!(source = %result.stage, latency_us = result.latency_us, "Classified");

    println!("{}", serde_json::to_string_pretty(&result.classification)?);
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("poclass=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poclass=info"))
    };

    // stdout carries the `classify` JSON output
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "poclass_classifications_total",
        "Total number of classifications by deciding stage"
    );
    metrics::describe_counter!(
        "poclass_llm_attempts_total",
        "Language model attempts by outcome"
    );
    metrics::describe_histogram!(
        "poclass_cascade_latency_us",
        metrics::Unit::Microseconds,
        "Cascade latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
