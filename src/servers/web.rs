use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::auth::{
    auth_router, AuthService, CredentialHasher, MailDispatcher, SqliteCredentialStore, TokenService,
};
use crate::catalog::{catalog_router, CatalogState};
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::StorefrontError;

// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    pub host: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl From<&AppConfig> for WebConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
        }
    }
}

/// Everything the handlers share
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub catalog: CatalogState,
}

impl AppState {
    /// Open the database from `config` and wire up every service
    pub fn build(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::open(&config.database_path)?;
        log::info!("Database ready at {}", config.database_path.display());

        Self::with_database(db, config, MailDispatcher::from_config(config))
    }

    /// Wire services on top of an already opened database
    pub fn with_database(
        db: Database,
        config: &AppConfig,
        mailer: MailDispatcher,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let auth = AuthService::new(
            Arc::new(SqliteCredentialStore::new(db.clone())),
            CredentialHasher::from_config(config)?,
            TokenService::new(&config.secret_key),
            mailer,
            config.token_ttl(),
        );

        Ok(Self {
            auth: Arc::new(auth),
            catalog: CatalogState::new(db),
        })
    }
}

/// Largest accepted request body. Product images travel inline as base64.
pub const MAX_BODY_BYTES: usize = 3 * 1024 * 1024;

/// Full application router: `/auth`, catalog and cart, CORS and the JSON 404/405
pub fn app_router(state: AppState, origins: &[String]) -> Router {
    Router::new()
        .nest("/auth", auth_router(state.auth.clone()))
        .merge(catalog_router(state.catalog, state.auth))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            // A wildcard cannot be combined with credentials.
            if origin.trim() == "*" {
                log::warn!("Ignoring wildcard CORS origin, list the allowed origins instead");
                return None;
            }
            match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn route_not_found() -> StorefrontError {
    StorefrontError::RouteNotFound
}

async fn method_not_allowed() -> StorefrontError {
    StorefrontError::MethodNotAllowed
}

pub struct WebServer {
    config: WebConfig,
    app: Router,
}

impl WebServer {
    pub fn new(config: WebConfig, state: AppState, origins: &[String]) -> Self {
        Self {
            config,
            app: app_router(state, origins),
        }
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        log::info!("Storefront API listening on http://{}", addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
