//! Backend entry-point: loads settings, wires adapters and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use diary_backend::domain::ports::{ObjectStore, TokenService};
use diary_backend::inbound::http::health::HealthState;
use diary_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use diary_backend::outbound::security::JwtTokenService;
use diary_backend::outbound::storage::{InMemoryObjectStore, S3ObjectStore};
use diary_backend::settings::{AppSettings, BuildMode};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        bind_addr = %settings.bind_addr,
        jwt_secret_fingerprint = %settings.jwt_secret.fingerprint(),
        ephemeral_secret = settings.jwt_secret.is_ephemeral(),
        "settings loaded"
    );

    let store: Arc<dyn ObjectStore> = match &settings.storage {
        Some(storage) => {
            info!(bucket = %storage.bucket, region = %storage.region, "using S3 object store");
            Arc::new(S3ObjectStore::connect(storage).await)
        }
        None => {
            warn!("using in-memory object store; photos are lost on restart");
            Arc::new(InMemoryObjectStore::new())
        }
    };
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
        settings.jwt_secret.as_bytes(),
        settings.token_lifetime,
    ));

    let mut config = ServerConfig::new(settings.bind_addr, store, tokens);
    match &settings.database_url {
        Some(database_url) => {
            if settings.run_migrations {
                run_pending_migrations(database_url)
                    .await
                    .map_err(std::io::Error::other)?;
            }
            let pool = DbPool::new(PoolConfig::new(database_url.as_str()))
                .await
                .map_err(std::io::Error::other)?;
            config = config.with_db_pool(pool);
        }
        None => warn!("using in-memory repositories; data is lost on restart"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(bind_addr = %settings.bind_addr, "listening");
    server.await
}
