use moodsync::{
    load_data, messages::MessageTable, notify::{run_daily_check, LogNotifier}, router, AppState,
    Config,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    if let Some(date) = config.fixed_date {
        warn!("clock pinned to {date}");
    }

    let data = load_data(&config.data_path).await;
    let state = AppState::new(
        config.data_path.clone(),
        data,
        config.clock(),
        MessageTable::builtin()?,
        Arc::new(LogNotifier),
    );

    tokio::spawn(run_daily_check(state.clone(), config.notify_interval));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
