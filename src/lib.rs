pub(crate) mod controllers;
pub(crate) mod core;
pub(crate) mod routes;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod utils;

use std::sync::Arc;

use axum::ServiceExt;
use axum::extract::Request;
use config::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::Args;
use crate::core::error::ConfigError as Error;
use crate::core::state::AppState;
use crate::core::store::PgCredentialStore;
use crate::token::TokenCodec;

pub async fn run() -> Result<(), Error> {
    let config = Config::builder()
        .add_source(config::File::with_name("backoffice").required(false))
        .add_source(config::Environment::with_prefix("BACKOFFICE").try_parsing(true))
        .build()
        .map_err(Error::Config)?;

    let args = config.try_deserialize::<Args>().map_err(Error::Config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&args.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let codec = TokenCodec::new(
        &args.access_secret,
        &args.refresh_secret,
        args.access_ttl(),
        args.refresh_ttl(),
    )?;

    let pool = PgPoolOptions::new()
        .max_connections(args.database_max_connections)
        .acquire_timeout(args.store_timeout())
        .connect(&args.database_url())
        .await
        .map_err(Error::Sql)?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(Error::DatabaseMigration)?;

    let store = Arc::new(PgCredentialStore::new(pool.clone()));
    let state = AppState::new(pool, store, codec, &args)?;

    if let (Some(username), Some(password)) = (&args.bootstrap_username, &args.bootstrap_password) {
        let created = state
            .admin_controller
            .seed_super_admin(username, password)
            .await
            .map_err(Error::Bootstrap)?;

        if created {
            tracing::info!(username = %username, "seeded super admin");
        }
    }

    let app = routes::router::routes(state, args.rate_limit_per_second);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .map_err(Error::IO)?;

    tracing::info!("listening on port {}", args.port);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::IO)?;

    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
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

    tracing::info!("shutdown signal received, draining connections");
}
