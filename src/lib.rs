pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod metadata;
pub mod models;
pub mod pages;
pub mod routes;
pub mod schedule;
pub mod structured;
pub mod telemetry;
pub mod timezone;
pub mod window;
mod utils;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use config::SiteConfig;
use db::Store;
use routes::AppState;

/// Loads config, prepares the database and serves the site until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    let config = SiteConfig::load().context("failed to load site config")?;
    telemetry::init(&config.log_level);

    prepare_database(&config).await?;

    let addr = config.bind_addr.clone();
    let app = routes::router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("jazz-nyc listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn prepare_database(config: &SiteConfig) -> anyhow::Result<()> {
    let path = config.database_path();
    let seed = config.seed_sample_data;
    let today = routes::eastern_today(Utc::now());

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let store =
            Store::open(&path).with_context(|| format!("failed to open database {:?}", path))?;
        if seed && store.seed_if_empty(today)? {
            info!("seeded sample listings into {:?}", path);
        }
        Ok(())
    })
    .await??;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
