use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_recs_api::{
    config::Config,
    db::{create_pool, SqliteStore},
    routes::{create_router, AppState},
    services::ModelCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recs_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!(database_url = %config.database_url, "Connected to movie store");

    let models = Arc::new(ModelCache::new(
        Arc::new(SqliteStore::new(pool)),
        config.model_settings(),
    ));
    // A failed build aborts startup rather than surfacing on the first request.
    models.get().await?;

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let state = AppState {
        models,
        default_count: config.recommendation_count,
        max_count: config.max_recommendation_count,
    };
    let app = create_router(state).layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
