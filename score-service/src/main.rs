mod analytics;
mod badges;
mod catalog;
mod config;
mod handlers;
mod models;
mod scoring;
mod services;
mod store;
mod workers;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use shared::database::postgres::create_pool;
use shared::database::redis::RedisClient;
use shared::observability::{init_default_logging, init_production_logging};

use crate::catalog::EventCatalog;
use crate::config::Config;
use crate::services::score_service::ScoreService;
use crate::store::postgres::PostgresScoreStore;
use crate::store::ScoreStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    if config.server.log_json {
        init_production_logging("score-service")?;
    } else {
        init_default_logging("score-service")?;
    }
    info!("Starting Score Service...");

    // Initialize database connection pool
    let db_pool = create_pool(&config.database).await?;
    info!("Database connection pool established");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    info!("Database migrations completed");

    // Initialize Redis cache
    let cache = if config.redis.cache_enabled {
        let client = RedisClient::connect(&config.redis.url).await?;
        info!("Redis connection established");
        Some(client)
    } else {
        info!("Redis cache disabled");
        None
    };

    // Initialize score service
    let catalog = Arc::new(EventCatalog::builtin());
    let store: Arc<dyn ScoreStore> = Arc::new(PostgresScoreStore::new(db_pool.clone()));
    let score_service = Arc::new(ScoreService::new(
        config.score.clone(),
        catalog.clone(),
        store,
        cache,
    ));
    info!("Score service initialized ({} event types)", catalog.len());

    // Start background ledger audit
    tokio::spawn(workers::ledger_audit::start(
        score_service.clone(),
        config.score.audit_interval_secs,
        config.score.audit_batch_size,
    ));

    // Build application state
    let app_state = Arc::new(AppState {
        db_pool,
        catalog,
        score_service,
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health::health_check))

        // Score endpoints
        .route("/api/v1/scores/events", get(handlers::score::list_event_types))
        .route("/api/v1/scores/:user_id", get(handlers::score::get_score))
        .route("/api/v1/scores/:user_id/events", post(handlers::score::apply_event))
        .route("/api/v1/scores/:user_id/ratings", post(handlers::score::submit_rating))
        .route("/api/v1/scores/:user_id/history", get(handlers::score::get_history))

        // Analytics endpoints
        .route("/api/v1/analytics/distribution", get(handlers::analytics::get_score_distribution))

        // Admin endpoints
        .route("/api/v1/admin/scores/:user_id/recalculate", post(handlers::admin::recalculate_score))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Score Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub catalog: Arc<EventCatalog>,
    pub score_service: Arc<ScoreService>,
}
