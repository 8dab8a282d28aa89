//! OpenRelay Server
//!
//! An off-chain order relay: accepts signed trading orders over HTTP,
//! validates them against protocol policy, and distributes them through an
//! asynchronous pipeline that refreshes on-chain fill state and persists
//! every observation to Postgres.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use async_trait::async_trait;
use clap::Parser;
use config::{build_directories, build_pools, get_database_url, ConfigLoader, RelayTuning};
use kanau::processor::Processor;
use openrelay_core::channels::{mock_channel, mock_publisher, ConsumerChannel, MockChannel, Publisher};
use openrelay_core::entities::exchange::{DbExchangeLookup, EnsureExchange};
use openrelay_core::entities::DatabaseProcessor;
use openrelay_core::processors::{
    FillConsumer, FillState, FilledLookup, LookupError, PersistenceConsumer,
};
use openrelay_sdk::objects::Order;
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OpenRelay - off-chain order relay for a decentralized exchange protocol
#[derive(Parser, Debug)]
#[command(name = "openrelay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./openrelay-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

/// Fill source that reports every order as untouched.
///
/// TODO: replace with an exchange-contract RPC lookup once the node
/// client is wired in; until then reprocessing only re-derives expiry.
struct StaticFillSource;

#[async_trait]
impl FilledLookup for StaticFillSource {
    async fn fill_state(&self, _order: &Order) -> Result<FillState, LookupError> {
        Ok(FillState {
            filled: alloy_primitives::U256::ZERO,
            cancelled: false,
        })
    }
}

/// The result of wiring the reprocessing pipeline.
struct RelayPipeline {
    /// Publisher the ingest handler appends admitted orders to.
    ingest_publisher: Arc<dyn Publisher>,
    /// Topics that must keep draining while the server runs.
    channels: Vec<MockChannel>,
    /// Log-only subscribers for the change and dead-letter topics.
    drain_tasks: Vec<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting openrelay-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let database_url = get_database_url().inspect_err(|e| {
        tracing::error!("Postgres environment incomplete: {e}");
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed successfully");
    }

    seed_exchanges(&config, &db_pool).await;

    let tuning = RelayTuning::from_config(&config);
    let pipeline = setup_pipeline(&db_pool, tuning);

    let (accounts, affiliates, terms) = build_directories(&config);
    let state = AppState {
        db: db_pool.clone(),
        pools: build_pools(&config).await,
        accounts,
        affiliates,
        terms,
        exchanges: Arc::new(DbExchangeLookup::new(db_pool.clone())),
        ingest: pipeline.ingest_publisher.clone(),
        lookup_timeout: tuning.lookup_timeout,
    };

    // Listen for SIGHUP pool-config reloads for the life of the server.
    let reload_notify = shutdown::spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // --- Graceful shutdown sequence ---

    reload_notify.notify_one();

    tracing::info!("Stopping pipeline consumers...");
    for channel in &pipeline.channels {
        channel.stop_consuming();
    }
    for task in pipeline.drain_tasks {
        task.abort();
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Wire the reprocessing pipeline over the in-process transport.
///
/// # Message flow
///
/// ```text
/// ingest handler -> ingest topic -> FillConsumer
/// FillConsumer   -> all topic    -> PersistenceConsumer -> Postgres
/// FillConsumer   -> change topic -> (notification fan-out)
/// PersistenceConsumer -> dead-letter topic on poison payloads
/// ```
fn setup_pipeline(db_pool: &PgPool, tuning: RelayTuning) -> RelayPipeline {
    let (ingest_publisher, ingest_channel) = mock_channel();
    let (all_publisher, all_channel) = mock_channel();
    let (change_publisher, mut change_rx) = mock_publisher();
    let (dead_letter_publisher, mut dead_letter_rx) = mock_publisher();

    let fill_consumer = FillConsumer::with_config(
        all_publisher,
        change_publisher,
        Arc::new(StaticFillSource),
        tuning.fill,
    );
    ingest_channel.add_consumer(Arc::new(fill_consumer));
    ingest_channel.start_consuming();

    let persistence = PersistenceConsumer::new(DatabaseProcessor {
        pool: db_pool.clone(),
    })
    .with_dead_letter(dead_letter_publisher);
    all_channel.add_consumer(Arc::new(persistence));
    all_channel.start_consuming();

    // No push subscribers are wired yet; keep the change topic draining so
    // publishes stay observable.
    let change_drain = tokio::spawn(async move {
        while let Some(payload) = change_rx.recv().await {
            tracing::debug!(bytes = payload.len(), "order state change published");
        }
    });
    let dead_letter_drain = tokio::spawn(async move {
        while let Some(payload) = dead_letter_rx.recv().await {
            tracing::warn!(bytes = payload.len(), "payload landed in the dead-letter topic");
        }
    });

    tracing::info!(workers = tuning.fill.workers, "Reprocessing pipeline started");

    RelayPipeline {
        ingest_publisher,
        channels: vec![ingest_channel, all_channel],
        drain_tasks: vec![change_drain, dead_letter_drain],
    }
}

/// Insert the config-declared exchange rows, ignoring ones already there.
async fn seed_exchanges(config: &config::FileConfig, db_pool: &PgPool) {
    let processor = DatabaseProcessor {
        pool: db_pool.clone(),
    };
    for exchange in &config.exchanges {
        if let Err(e) = processor
            .process(EnsureExchange {
                network: exchange.network,
                address: exchange.address,
            })
            .await
        {
            tracing::error!(
                error = %e,
                network = exchange.network,
                address = %exchange.address,
                "failed to seed exchange registry row"
            );
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
