//! Application setup and server configuration.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domains::content::activities::MAX_IMAGE_BYTES;
use crate::kernel::ServerDeps;
use crate::server::middleware::{
    extract_client_ip, hash_secret, jwt_auth_middleware, API_KEY_HEADER, WORKER_SECRET_HEADER,
};
use crate::server::routes::{
    create_blog_post_handler, create_generation_handler, get_job_handler, health_handler,
    list_jobs_handler, list_photos_handler, process_queue_handler, requeue_job_handler,
    sitemap_handler, update_caption_handler,
};

/// Request bodies on the intake route: the image plus form fields
const INTAKE_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 2 * 1024 * 1024;

/// Inline processing can run a full completion, so the ceiling is generous
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    /// Public site origin used for sitemap URLs
    pub site_url: Arc<str>,
    /// SHA-256 hex of the blog intake key
    pub blog_api_key_hash: Arc<str>,
    /// SHA-256 hex of the worker secret, when one is configured
    pub worker_secret_hash: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        deps: ServerDeps,
        site_url: &str,
        blog_api_key: &str,
        worker_secret: Option<&str>,
    ) -> Self {
        Self {
            deps,
            site_url: Arc::from(site_url.trim_end_matches('/')),
            blog_api_key_hash: Arc::from(hash_secret(blog_api_key)),
            worker_secret_hash: worker_secret.map(|s| Arc::from(hash_secret(s))),
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid origin: {}", o)))
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(WORKER_SECRET_HEADER),
        ]))
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let jwt_service = state.deps.jwt_service.clone();

    // Intake: bursts of 10 per client, then one request every 6 seconds.
    // Keyed on X-Forwarded-For / X-Real-IP, falling back to the peer address.
    let intake_rate_limit = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(6)
            .burst_size(10)
            .use_headers()
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let intake = Router::new().route(
        "/api/blog-posts",
        post(create_blog_post_handler)
            .layer::<_, Infallible>(DefaultBodyLimit::max(INTAKE_BODY_LIMIT))
            .layer(GovernorLayer {
                config: intake_rate_limit,
            }),
    );

    let admin = Router::new()
        .route("/api/generation", post(create_generation_handler))
        .route("/api/generation/jobs", get(list_jobs_handler))
        .route("/api/generation/jobs/:id", get(get_job_handler))
        .route("/api/generation/jobs/:id/requeue", post(requeue_job_handler))
        .route("/api/generation/process", post(process_queue_handler))
        .route("/api/photos", get(list_photos_handler))
        .route("/api/photos/:id/caption", patch(update_caption_handler));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .merge(admin)
        .merge(intake)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(state))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
