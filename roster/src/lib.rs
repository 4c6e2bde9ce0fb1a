//! # roster: a template-driven directory service
//!
//! `roster` is a small HTTP service over a PostgreSQL people/users
//! directory. Its defining design decision is that **no SQL text lives in
//! application code**: every statement is a named, parameterized template
//! loaded at startup from `*.sql.yml` documents into an immutable
//! [`db::templates::TemplateRegistry`], and executed through the
//! transactional [`db::query::QueryUnit`] facade over a pooled connection.
//!
//! ## Request flow
//!
//! A request to `/people/{id}` reaches an [`api::handlers`] function, which
//! asks the [`db::handlers::People`] repository for the record. The
//! repository resolves the `people.findById` template from the registry,
//! builds a query unit with the id as a positional parameter, and executes
//! it: one connection is acquired from the pool, the statement runs
//! (wrapped in `BEGIN`/`COMMIT` when the operation opted into a
//! transaction), and the connection is released on every exit path. Rows
//! come back as column-name → value objects and deserialize into
//! [`db::models`] types; the handler serializes the result or maps the
//! error through [`errors::Error`].
//!
//! ## Lifecycle
//!
//! 1. **Create**: [`Application::new`] loads configuration, scans the
//!    template directory (any malformed file or duplicate key aborts
//!    startup), and connects the connection pool
//! 2. **Serve**: [`Application::serve`] binds a TCP port and handles
//!    requests until the shutdown signal fires
//! 3. **Shutdown**: the server drains gracefully and the pool closes

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
use db::postgres::PgExecutionPool;
use db::templates::TemplateRegistry;
use db::Database;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

/// Build the CORS layer from configuration. `["*"]` allows any origin.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = if config.cors.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .cors
            .allowed_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin {origin:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Assemble the application router: health check plus the people and users
/// modules, with request tracing and CORS applied.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let people_routes = Router::new()
        .route(
            "/",
            get(api::handlers::people::list_people).post(api::handlers::people::create_person),
        )
        .route("/search/{name}", get(api::handlers::people::search_people))
        .route(
            "/{id}",
            get(api::handlers::people::get_person)
                .put(api::handlers::people::update_person)
                .delete(api::handlers::people::delete_person),
        );

    let users_routes = Router::new()
        .route(
            "/",
            get(api::handlers::users::list_users).post(api::handlers::users::create_user),
        )
        .route("/search/{name}", get(api::handlers::users::search_users))
        .route(
            "/{id}",
            get(api::handlers::users::get_user)
                .put(api::handlers::users::update_user)
                .delete(api::handlers::users::delete_user),
        );

    let cors_layer = create_cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/people", people_routes)
        .nest("/users", users_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state))
}

/// Main application struct that owns all resources and lifecycle.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgExecutionPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    ///
    /// The template registry is built before anything else: a malformed
    /// template file or duplicate key aborts startup here, and no facade
    /// call can run before registration has completed.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let templates = TemplateRegistry::load(&config.sql_dir)
            .with_context(|| format!("failed to load SQL templates from {}", config.sql_dir.display()))?;
        info!(
            count = templates.len(),
            dir = %config.sql_dir.display(),
            "registered SQL templates"
        );

        let pool = PgExecutionPool::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        let db = Database::new(Arc::new(pool.clone()), templates);

        Self::from_parts(config, db, Some(pool))
    }

    /// Create an application over an existing database handle. Used by
    /// tests to substitute a fake pool and an inline template set.
    pub fn with_database(config: Config, db: Database) -> anyhow::Result<Self> {
        Self::from_parts(config, db, None)
    }

    fn from_parts(config: Config, db: Database, pool: Option<PgExecutionPool>) -> anyhow::Result<Self> {
        let state = AppState {
            db,
            config: Arc::new(config.clone()),
        };
        let router = build_router(state)?;
        Ok(Self { router, config, pool })
    }

    /// Convert the application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("failed to create test server")
    }

    /// Start serving the application until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("roster listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
