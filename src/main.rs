// src/main.rs
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use users_api::{
    app::{build_app, run, shutdown_signal},
    config::Config,
    services::Users,
    state::AppState,
    storage::PgUsersStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config first: .env may carry RUST_LOG
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Connection or migration failure aborts startup
    let storage = Arc::new(PgUsersStorage::connect(&config, info_span!("storage")).await?);
    info!("database ready");

    let users = Users::new(storage.clone(), info_span!("service"));
    let app_state = Arc::new(AppState {
        users: Arc::new(users),
        log: info_span!("controller"),
    });
    let app = build_app(app_state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    run(listener, app, shutdown_signal()).await?;

    storage.close().await;
    info!("application stopped");
    Ok(())
}
