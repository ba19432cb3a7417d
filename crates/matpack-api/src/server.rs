//! API server implementation.
//!
//! Provides health, ready, and generation endpoints for the Matpack service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use matpack_core::{DataPaths, Error, Result};
use matpack_data::{ArchiveProducer, RunRegistry};

use crate::config::{Config, CorsConfig};

// ============================================================================
// Health and Ready Responses
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Run registry (mutex-guarded map + persisted mirror).
    pub registry: Arc<RunRegistry>,
    /// Archive producer over the data root.
    pub producer: ArchiveProducer,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("producer", &self.producer)
            .finish()
    }
}

impl AppState {
    /// Creates application state from configuration: loads the persisted
    /// registry (empty if absent) and prepares the staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file is malformed or the staging
    /// root cannot be created.
    pub fn from_config(config: Config) -> Result<Self> {
        let data_paths = DataPaths::new(&config.data_root);

        if let Some(parent) = config.registry_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::storage_with_source(
                    format!("create registry directory {}", parent.display()),
                    e,
                )
            })?;
        }
        std::fs::create_dir_all(&config.staging_root).map_err(|e| {
            Error::storage_with_source(
                format!("create staging root {}", config.staging_root.display()),
                e,
            )
        })?;

        let registry = RunRegistry::load(&config.registry_path, data_paths.clone())
            .map_err(|e| Error::Internal {
                message: format!("load registry: {e}"),
            })?
            .with_status_threshold_secs(config.status_threshold_secs);

        let producer = ArchiveProducer::new(data_paths, &config.staging_root);

        Ok(Self {
            config,
            registry: Arc::new(registry),
            producer,
        })
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// Returns 200 OK if the service is ready to accept requests.
/// Checks that the simulation data root is reachable.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.config.data_root.is_dir() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some(format!(
                    "data root unavailable: {}",
                    state.config.data_root.display()
                )),
            }),
        )
    }
}

// ============================================================================
// Server
// ============================================================================

/// The Matpack API server.
pub struct Server {
    config: Config,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").field("config", &self.config).finish()
    }
}

impl Server {
    /// Creates a new server with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    ///
    /// # Errors
    ///
    /// Returns an error if application state cannot be constructed (e.g. a
    /// malformed registry file).
    fn create_router(&self) -> Result<Router> {
        let state = Arc::new(AppState::from_config(self.config.clone())?);

        let cors = Self::build_cors_layer(&self.config.cors);

        let router = Router::new()
            // Health, ready, and docs endpoints
            .route("/health", get(health))
            .route("/ready", get(ready))
            .route("/openapi.json", get(crate::openapi::serve_openapi))
            // Generation API
            .nest("/v1", crate::routes::v1_routes())
            // Middleware (order matters): trace outermost, then CORS.
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        Ok(router)
    }

    fn build_cors_layer(cors_config: &CorsConfig) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([
                header::CONTENT_TYPE,
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-request-id"),
            ])
            .max_age(Duration::from_secs(cors_config.max_age_seconds));

        Self::apply_cors_allowed_origins(cors, cors_config)
    }

    fn apply_cors_allowed_origins(cors: CorsLayer, cors_config: &CorsConfig) -> CorsLayer {
        if cors_config.allowed_origins.is_empty() {
            return cors;
        }

        if cors_config.allowed_origins.len() == 1
            && cors_config.allowed_origins[0] == "*"
        {
            return cors.allow_origin(Any);
        }

        if cors_config.allowed_origins.iter().any(|origin| origin == "*") {
            tracing::error!(
                origins = ?cors_config.allowed_origins,
                "Invalid CORS config: '*' must be the only allowed origin"
            );
            return cors;
        }

        let mut allowed = Vec::new();
        for origin in &cors_config.allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => allowed.push(value),
                Err(_) => {
                    tracing::error!(
                        origin = %origin,
                        "Invalid CORS origin; expected a valid HeaderValue"
                    );
                }
            }
        }

        if allowed.is_empty() {
            tracing::warn!("All configured CORS origins were invalid; disabling CORS");
            cors
        } else {
            tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, state cannot be built, or the
    /// server cannot bind to the port.
    pub async fn serve(&self) -> Result<()> {
        self.config.validate()?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router()?;

        tracing::info!(
            http_port = self.config.http_port,
            data_root = %self.config.data_root.display(),
            "Starting Matpack API server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to test
    /// the routes without actually binding to a port.
    ///
    /// # Errors
    ///
    /// Returns an error if application state cannot be constructed.
    #[doc(hidden)]
    pub fn test_router(&self) -> Result<Router> {
        self.create_router()
    }
}
