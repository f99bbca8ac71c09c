//! addr-daemon entry point.
//!
//! Thin wiring: config, tracing, store client, watcher, dispatch task and the
//! HTTP server. Handlers live in `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use addr_config::{
    load_layered_yaml, report_unused_keys, resolve_store_token, AgentConfig, UnusedKeyPolicy,
};
use addr_daemon::{routes, state};
use addr_reconcile::{AddressSource, DocumentStore};
use addr_schemas::ADDRESS_CONFIG_SELECTOR;
use addr_store::{HttpStore, PollingWatcher};
use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "addr-daemon")]
#[command(about = "Address reconciliation agent", long_about = None)]
struct Args {
    /// Layered YAML config files; later files override earlier ones.
    #[arg(long = "config", required = true)]
    config: Vec<String>,

    /// Fail startup when the config contains keys the agent does not read.
    #[arg(long, default_value_t = false)]
    strict_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();
    let args = Args::parse();

    let paths: Vec<&str> = args.config.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&paths)?;
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config contains unused keys");
    }
    let cfg = AgentConfig::from_loaded(&loaded)?;
    info!(
        config_hash = %loaded.config_hash,
        address_space = %cfg.address_space,
        store = %cfg.store.base_url,
        "config loaded"
    );

    let token = resolve_store_token(&cfg)?;
    let store: Arc<dyn DocumentStore> = Arc::new(
        HttpStore::from_config(&cfg.store, token).context("store client init failed")?,
    );

    let source = AddressSource::new(cfg.address_space.clone(), Arc::clone(&store));
    let events = source.subscribe();
    let shared = Arc::new(state::AppState::new(source));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    state::spawn_address_relay(events, shared.bus.clone());
    let batches = PollingWatcher::spawn(
        store,
        ADDRESS_CONFIG_SELECTOR,
        Duration::from_millis(cfg.watch.poll_interval_ms),
    );
    state::spawn_dispatch(Arc::clone(&shared), batches);

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = match bind_addr_from_env() {
        Some(addr) => addr,
        None => cfg
            .daemon
            .bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid daemon.bind_addr: {}", cfg.daemon.bind_addr))?,
    };
    info!("addr-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("ADDR_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}
