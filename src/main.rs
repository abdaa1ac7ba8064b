//! Topic exchange service.
//!
//! # Architecture Overview
//!
//! ```text
//!   POST /send/{key} ──▶ http ──▶ TopicExchange ──▶ Dispatcher ──▶ Router ──▶ RoutingTable
//!                                     │                 │                         ▲
//!                                     │                 ▼                         │ snapshot
//!                                     │          MemoryQueueStore          BindingRegistry
//!                                     │                 │  drop_queue             ▲
//!   POST /bindings ───────────────────┴─────────────────┼─────────────────────────┘
//!                                                       └── on_queue_deleted (cascade)
//! ```
//!
//! Startup order: config → logging → metrics → queue store → bindings
//! (file, then config) → listener. Shutdown: signal → drain HTTP → save
//! bindings.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use topic_exchange::config::{self, ExchangeConfig};
use topic_exchange::dispatch::MemoryQueueStore;
use topic_exchange::lifecycle::{signals, Shutdown};
use topic_exchange::observability::{logging, metrics};
use topic_exchange::{HttpServer, TopicExchange};

#[derive(Debug, Parser)]
#[command(name = "topic-exchange", version, about = "AMQP-style topic routing over named queues")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ExchangeConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "topic-exchange starting");
    if let Some(path) = &args.config {
        tracing::info!(path = %path.display(), "Configuration loaded");
    }

    if config.observability.metrics_enabled {
        // Address already checked by config validation.
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(error = %e, "Failed to parse metrics address"),
        }
    }

    let exchange = build_exchange(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(exchange.clone()).run(listener, &shutdown).await?;

    if let Err(e) = exchange.save() {
        tracing::error!(error = %e, "Failed to save bindings on shutdown");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Create configured queues, load persisted bindings, then apply
/// configured bindings on top.
fn build_exchange(config: &ExchangeConfig) -> Result<TopicExchange, Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryQueueStore::new());
    for queue in &config.queues {
        store.create_queue(&queue.name);
    }

    let exchange = match &config.persistence.bindings_path {
        Some(path) => TopicExchange::open(store, path)?,
        None => TopicExchange::new(store),
    };

    // Persisted rows may reference queues that are no longer configured.
    exchange.prune_orphans();

    for binding in &config.bindings {
        exchange.bind_topic(&binding.pattern, &binding.queue)?;
    }
    exchange.save()?;

    tracing::info!(
        queues = config.queues.len(),
        bindings = exchange.list_bindings().len(),
        "Exchange ready"
    );
    Ok(exchange)
}
