mod catalog;
mod config;
mod db;
mod game;
mod handlers;
mod models;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub db_pool: SqlitePool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "villagehub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = config::Config::from_env().context("Invalid configuration")?;

    // Set up database
    tracing::info!("Connecting to database: {}", config.database_url);
    let db_pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    if config.seed_shop_catalog {
        tracing::info!("Seeding shop catalog");
        catalog::seed_catalog(&db_pool, &catalog::DEFAULT_CATALOG)
            .await
            .context("Failed to seed shop catalog")?;
    } else {
        tracing::info!("Shop catalog seeding disabled");
    }

    let state = Arc::new(AppState { db_pool });
    let app = handlers::router(state);

    // Start server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
