use blogpost_api::{
    AppState, MemoryStore, PostgresRepository, PostgresSearch,
    config::{AppConfig, Env},
    create_router,
    repository::RepositoryState,
    search::SearchState,
};
use sqlx::postgres::PgPoolOptions;
use std::{error::Error, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging and persistence, then serves HTTP.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // RUST_LOG wins over the defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blogpost_api=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let (repo, search) = match config.db_url.as_deref() {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(db_url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations applied.");

            (
                Arc::new(PostgresRepository::new(pool.clone())) as RepositoryState,
                Arc::new(PostgresSearch::new(pool)) as SearchState,
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on exit.");
            let store = MemoryStore::new();
            (
                Arc::new(store.clone()) as RepositoryState,
                Arc::new(store) as SearchState,
            )
        }
    };

    let bind_addr = config.bind_addr.clone();
    let public_url = config.public_url.clone();
    let app = create_router(AppState {
        repo,
        search,
        config,
    });

    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: {}/swagger-ui", public_url);

    axum::serve(listener, app).await?;
    Ok(())
}
