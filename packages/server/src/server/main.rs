// Main entry point for API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use openai_client::OpenAIClient;
use site_api::domains::auth::JwtService;
use site_api::kernel::{
    scheduled_tasks::start_scheduler, BaseImageStore, HostedImageStore, OpenAIVision,
    QueueSettings, ServerDeps,
};
use site_api::server::{build_app, AppState};
use site_api::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,site_api=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting site API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let http_timeout = Duration::from_secs(config.http_timeout_secs);

    // Completion client
    let mut openai = OpenAIClient::new(config.openai_api_key.clone()).with_timeout(http_timeout)?;
    if let Some(base_url) = &config.openai_base_url {
        openai = openai.with_base_url(base_url.clone());
    }
    let ai = Arc::new(OpenAIVision::new(Arc::new(openai), config.openai_model.clone()));

    // Image storage is optional; without it intake rejects uploads
    let image_store: Option<Arc<dyn BaseImageStore>> = match config.storage() {
        Some((url, key)) => Some(Arc::new(HostedImageStore::new(
            url,
            key,
            config.storage_bucket.clone(),
            http_timeout,
        )?)),
        None => {
            tracing::warn!("STORAGE_URL/STORAGE_SERVICE_KEY not set, image uploads disabled");
            None
        }
    };

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let queue = QueueSettings {
        batch_size: config.job_batch_size,
        max_attempts: config.job_max_attempts,
        stale_after: chrono::Duration::minutes(config.job_stale_after_minutes),
    };

    let deps = ServerDeps::new(pool, ai, image_store, jwt_service, queue);

    // Optional in-process poller; the HTTP trigger works either way
    let _scheduler = match &config.worker_cron {
        Some(schedule) => Some(
            start_scheduler(deps.clone(), schedule)
                .await
                .context("Failed to start scheduler")?,
        ),
        None => {
            tracing::info!("WORKER_CRON not set, queue runs only via /api/generation/process");
            None
        }
    };

    let state = AppState::new(
        deps,
        &config.site_url,
        &config.blog_api_key,
        config.worker_secret.as_deref(),
    );
    let app = build_app(state, &config.allowed_origins)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
