mod config;
mod db_types;
mod error;
mod gateway;
mod handlers;
mod store;
mod tasks;
#[cfg(test)]
mod test_utils;
mod types;
mod vapi_types;

use crate::config::Config;
use crate::gateway::VapiClient;
use crate::store::PgStore;
use crate::tasks::FollowUpScheduler;
use crate::types::AppState;

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A .env file is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("sqlx", tracing_subscriber::filter::LevelFilter::WARN),
            ("vapi_orders_rs", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    info!(config=?config, "loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&db_pool).await?;

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let gateway = Arc::new(VapiClient::new(
        reqwest::Client::new(),
        config.vapi_base_url.clone(),
        config.vapi_api_token.clone(),
        config.vapi_assistant_id.clone(),
        config.vapi_phone_number_id.clone(),
    ));
    let follow_ups = FollowUpScheduler::new(gateway.clone(), store.clone(), config.follow_up_delay);

    let app_state = Arc::new(AppState {
        orders: store.clone(),
        calls: store,
        gateway,
        follow_ups: follow_ups.clone(),
    });
    let app = handlers::router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "backend listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let dropped = follow_ups.shutdown();
    if dropped > 0 {
        warn!(dropped, "shutting down with follow-ups still armed; they will not run");
    }
    db_pool.close().await;
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error=%e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
