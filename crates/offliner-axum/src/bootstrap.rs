//! Composition root for the HTTP Edge binary: the only place concrete
//! adapters (`offliner-broker`, `offliner-store`, `offliner-quota`) are
//! named and wired into the narrow [`JobService`](crate::state::JobService)
//! seam routes depend on.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use offliner_broker::RedisBroker;
use offliner_core::config::Config;
use offliner_quota::QuotaTracker;
use offliner_store::RedisProgressStore;

use crate::state::DefaultJobService;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    AllowOrigins(Vec<String>),
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new().allow_origin(allowed).allow_methods(Any).allow_headers(Any)
        }
    }
}

/// Server configuration for the HTTP Edge.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub temp_root: PathBuf,
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// `PORT` (default 5000, matching the source), temp root derived from
    /// `OFFLINER_APP_ROOT` (default `.`).
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000);
        let app_root = std::env::var("OFFLINER_APP_ROOT").unwrap_or_else(|_| ".".to_string());
        Self {
            port,
            temp_root: PathBuf::from(app_root).join("Downloads").join("Temp"),
            cors: CorsConfig::default(),
        }
    }
}

/// Everything routes reach through `State<AppState>`.
pub struct AxumContext {
    pub job_service: Arc<DefaultJobService>,
}

/// Connect to Redis and assemble the `JobService`.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let core_config = Config::from_env();

    let broker = RedisBroker::connect(&core_config.redis_url)
        .await
        .context("connecting broker to Redis")?;
    let progress = RedisProgressStore::connect(&core_config.redis_url)
        .await
        .context("connecting progress store to Redis")?;
    let quota = QuotaTracker::new(core_config.quota);

    let job_service = Arc::new(DefaultJobService {
        broker: Arc::new(broker),
        progress: Arc::new(progress),
        quota: Arc::new(quota),
        temp_root: config.temp_root.clone(),
    });

    Ok(AxumContext { job_service })
}

/// Bootstrap and serve until the process is killed.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let cors = build_cors_layer(&config.cors);
    let app = crate::routes::create_router(ctx.job_service, cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "offliner HTTP edge listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
