//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared by every test in a binary. Migrations run
//! once into a template database; each test gets its own database cloned from
//! that template, so queue-wide operations never see another test's rows.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use site_api::domains::auth::{AdminUser, JwtService};
use site_api::kernel::test_dependencies::{MockImageStore, MockVisionAI};
use site_api::kernel::{BaseImageStore, QueueSettings, ServerDeps};
use site_api::server::{build_app, AppState};
use site_api::common::AdminUserId;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

const TEMPLATE_DB: &str = "site_template";

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_JWT_ISSUER: &str = "test-issuer";
pub const TEST_BLOG_API_KEY: &str = "test-blog-api-key";
pub const TEST_WORKER_SECRET: &str = "test-worker-secret";
pub const TEST_SITE_URL: &str = "https://concrete.example";

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Connection URL without the database name
    server_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=300"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let server_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);

        let admin = PgPool::connect(&format!("{}/postgres", server_url))
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::query(&format!("CREATE DATABASE {}", TEMPLATE_DB))
            .execute(&admin)
            .await
            .context("Failed to create template database")?;
        admin.close().await;

        // Migrate the template once; it must have no open connections when cloned
        let template = PgPool::connect(&format!("{}/{}", server_url, TEMPLATE_DB))
            .await
            .context("Failed to connect to template database")?;
        sqlx::migrate!("./migrations")
            .run(&template)
            .await
            .context("Failed to run migrations")?;
        template.close().await;

        Ok(Self {
            server_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }

    /// Clone the template into a fresh database and connect to it
    async fn fresh_database(&self) -> Result<PgPool> {
        let name = format!("test_{}", Uuid::new_v4().simple());

        let admin = PgPool::connect(&format!("{}/postgres", self.server_url)).await?;
        sqlx::query(&format!("CREATE DATABASE {} TEMPLATE {}", name, TEMPLATE_DB))
            .execute(&admin)
            .await
            .with_context(|| format!("Failed to create database {}", name))?;
        admin.close().await;

        PgPool::connect(&format!("{}/{}", self.server_url, name))
            .await
            .context("Failed to connect to test database")
    }
}

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let photo = create_photo(&ctx.db_pool, album, "New driveway").await.unwrap();
/// }
/// ```
pub struct TestHarness {
    /// Database pool - use this for test fixtures.
    pub db_pool: PgPool,
    /// Scripted completion client shared with `deps`
    pub ai: MockVisionAI,
    /// Recording image store shared with `deps`
    pub image_store: MockImageStore,
    pub jwt_service: Arc<JwtService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_ai(MockVisionAI::new()).await
    }

    /// Harness whose completion client replays the given script
    pub async fn with_ai(ai: MockVisionAI) -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let db_pool = infra.fresh_database().await?;

        Ok(Self {
            db_pool,
            ai,
            image_store: MockImageStore::new(),
            jwt_service: Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
        })
    }

    /// Swap the image store (e.g. for a failing one)
    pub fn with_image_store(mut self, store: MockImageStore) -> Self {
        self.image_store = store;
        self
    }

    /// Server dependencies wired to the mocks
    pub fn deps(&self) -> ServerDeps {
        let image_store: Arc<dyn BaseImageStore> = Arc::new(self.image_store.clone());
        ServerDeps::new(
            self.db_pool.clone(),
            Arc::new(self.ai.clone()),
            Some(image_store),
            self.jwt_service.clone(),
            QueueSettings::default(),
        )
    }

    /// Router with the full middleware stack
    pub fn app(&self) -> Router {
        let state = AppState::new(
            self.deps(),
            TEST_SITE_URL,
            TEST_BLOG_API_KEY,
            Some(TEST_WORKER_SECRET),
        );
        build_app(state, &[]).expect("Failed to build app")
    }

    /// Insert an active admin and mint a token for it
    pub async fn admin_token(&self) -> Result<(AdminUser, String)> {
        let id = AdminUserId::new();
        let admin = AdminUser::upsert(
            id,
            &format!("admin-{}@example.com", id),
            Some("Test Admin"),
            &self.db_pool,
        )
        .await?;
        let token = self
            .jwt_service
            .create_token(admin.id, &admin.email, true)?;
        Ok((admin, token))
    }

    /// Token for an identity with no admin_users row
    pub fn stranger_token(&self, is_admin: bool) -> Result<String> {
        self.jwt_service
            .create_token(AdminUserId::new(), "stranger@example.com", is_admin)
    }
}
