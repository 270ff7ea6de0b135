use soultrip_api::{app, AppState, AuthConfig};
use soultrip_search::SearchInferrer;
use soultrip_store::app_config::{Config, StorageBackend};
use soultrip_store::{DbClient, MemoryStore, PgBookingStore, PgProfileRepository, PgTourRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soultrip_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting SoulTrip API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
    };
    let inference = SearchInferrer::from_config(&config.inference)?;
    if config.inference.api_key.is_none() {
        tracing::info!("No inference API key configured, search inference uses keyword heuristics");
    }

    let app_state = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database).await?;
            db.migrate().await?;
            AppState::new(
                Arc::new(PgTourRepository::new(db.pool.clone())),
                Arc::new(PgBookingStore::new(db.pool.clone())),
                Arc::new(PgProfileRepository::new(db.pool.clone())),
                inference,
                auth,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on exit");
            AppState::in_memory(Arc::new(MemoryStore::new()), inference, auth)
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
