//! Triangular-arbitrage finder entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triangle_arb::api::{create_router, AppState};
use triangle_arb::arbitrage::{Detector, TobSimulator};
use triangle_arb::config::{Config, EnvConfig};
use triangle_arb::graph::GraphIndex;
use triangle_arb::ingest::IngressServer;
use triangle_arb::market::MarketRegistry;
use triangle_arb::metrics;
use triangle_arb::orderbook::{OrderBookStore, TopOfBookStore};
use triangle_arb::publish::{LogPublisher, Publisher, RpcPublisher};
use triangle_arb::utils::shutdown_signal;

/// Online triangular-arbitrage finder.
#[derive(Parser, Debug)]
#[command(name = "triangle-arb")]
#[command(about = "Detects triangular arbitrage cycles from order-book streams")]
#[command(version)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port for health/status.
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the finder (default).
    Run {
        /// HTTP server port for health/status.
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Check configuration validity and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.clone()));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    metrics::init_metrics();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Run { port }) => cmd_run(config, port).await,
        None => cmd_run(config, args.port).await,
    }
}

/// Validate the configuration and environment, print a summary.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    let env = EnvConfig::from_env()?;
    let listen_addr = env.listen_addr()?;
    let executor_addr = env.executor_addr()?;

    println!("Configuration OK");
    println!("  Quote assets: {:?}", config.quote_assets);
    println!(
        "  Default fees: taker={}bp maker={}bp",
        config.fees.default.taker, config.fees.default.maker
    );
    println!("  Fee overrides: {} exchange(s)", config.fees.exchanges.len());
    println!("  Min profit edge: {}", config.strategy.min_profit_edge);
    println!("  Slippage: {}bp", config.strategy.slippage_bp);
    println!("  Trade amount: {}", config.strategy.trade_amount);
    println!("  Orderbook depth: {}", config.strategy.orderbook_depth);
    println!("  Ingress: {listen_addr}");
    match executor_addr {
        Some(addr) => println!("  Executor: {addr}"),
        None => println!("  Executor: disabled (log-only publisher)"),
    }
    Ok(())
}

/// Run the finder until a shutdown signal arrives.
async fn cmd_run(config: Config, port: u16) -> anyhow::Result<()> {
    let env = EnvConfig::from_env()?;
    let listen_addr = env.listen_addr()?;
    let executor_addr = env.executor_addr()?;

    let config = Arc::new(config);
    let index = Arc::new(GraphIndex::new());
    let registry = Arc::new(MarketRegistry::new());
    let tobs = Arc::new(TopOfBookStore::new());
    let books = Arc::new(OrderBookStore::new());

    let publisher: Arc<dyn Publisher> = match &executor_addr {
        Some(addr) => {
            info!(executor = %addr, "plans will be proposed to the executor");
            Arc::new(RpcPublisher::new(addr.clone()))
        }
        None => {
            info!("EXECUTOR_ADDR not set, plans will be logged");
            Arc::new(LogPublisher)
        }
    };

    let sim = TobSimulator::new(
        config.strategy.min_profit_edge,
        config.strategy.slippage_bp,
    );
    let detector = Arc::new(Detector::new(
        index.clone(),
        tobs.clone(),
        registry.clone(),
        sim,
        publisher,
    ));

    // Health/status endpoints.
    let app_state = AppState::new(index.clone(), registry.clone());
    let http_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let http_listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");
    let router = create_router(app_state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!(error = %e, "HTTP server error");
        }
    });

    // Ingress.
    let ingress_listener = TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind ingress on {listen_addr}: {e}"))?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = Arc::new(IngressServer::new(
        config,
        index,
        registry,
        tobs,
        books,
        detector,
    ));
    let ingress = tokio::spawn(server.serve(ingress_listener, shutdown_rx));
    app_state.set_ready(true);
    info!("finder started");

    shutdown_signal().await;
    info!("shutdown signal received, draining");
    app_state.set_ready(false);
    let _ = shutdown_tx.send(true);
    match ingress.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "ingress exited with error"),
        Err(e) => error!(error = %e, "ingress task panicked"),
    }
    info!("shutdown complete");
    Ok(())
}
