use mimalloc::MiMalloc;
use qbo_bridge::api::{AccountingApi, build_http_client};
use qbo_bridge::config::Config;
use qbo_bridge::db::{AccountsStorage, CredentialsStorage, connect};
use qbo_bridge::router::{BridgeState, bridge_router};
use qbo_bridge::service::{AccountSync, TokenManager, sync_scheduler};
use qbo_bridge::IntuitOauthEndpoints;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let api_base = cfg.intuit.api_base()?;
    info!(
        database_url = %cfg.basic.database_url,
        proxy = %cfg.basic.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        environment = ?cfg.intuit.environment,
        api_base = %api_base,
        sync_interval_secs = cfg.sync.interval_secs
    );

    let pool = connect(&cfg.basic.database_url).await?;
    let http = build_http_client(&cfg.basic)?;

    let endpoints = IntuitOauthEndpoints::from_config(&cfg.intuit, http.clone())?;
    let tokens = TokenManager::new(CredentialsStorage::new(pool.clone()), endpoints);
    let accounts = AccountsStorage::new(pool);
    let sync = Arc::new(AccountSync::new(
        tokens.clone(),
        AccountingApi::new(http, api_base),
        accounts.clone(),
    ));

    let interval = cfg.sync.interval();
    let scheduler = sync_scheduler::spawn(sync, interval).await?;
    match interval {
        Some(_) => scheduler.trigger(),
        None => info!("Periodic account sync disabled"),
    }

    let app = bridge_router(BridgeState::new(scheduler.clone(), accounts, tokens));

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
