use crate::{
    api,
    registry::{EXPIRY_SECS, PresenceRegistry, SWEEP_INTERVAL},
};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeFile,
};
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PAGE_PATH: &str = "static/telegram.html";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Landing page served at `/`.
    pub page_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            page_path: PathBuf::from(DEFAULT_PAGE_PATH),
        }
    }
}

pub struct App {
    pub registry: Arc<PresenceRegistry>,
    pub config: ServerConfig,
    sweeper: JoinHandle<()>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(PresenceRegistry::new()), ServerConfig::default())
    }

    /// Must be called inside a tokio runtime: starts the sweeper right away.
    pub fn with_registry(registry: Arc<PresenceRegistry>, config: ServerConfig) -> Self {
        let sweeper = registry.spawn_sweeper(SWEEP_INTERVAL, EXPIRY_SECS);

        Self {
            registry,
            config,
            sweeper,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            // allow requests from any origin
            .allow_origin(Any);

        Router::new()
            .route_service("/", ServeFile::new(&self.config.page_path))
            .route("/api/users", get(api::users::list_active_users))
            .route(
                "/api/update",
                post(api::update::update_user).fallback(api::update::method_not_allowed),
            )
            .layer(cors)
            .with_state(self.registry.clone())
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], self.config.port));

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Presence server running on http://localhost:{}", self.config.port);
        info!(page = %self.config.page_path.display(), "Serving landing page at /");
        match axum::serve(listener, self.router()).await {
            Ok(_) => info!("Server shut down gracefully"),
            Err(e) => error!("Server error: {}", e),
        }

        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
