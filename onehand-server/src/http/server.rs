//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Uploaded images served under /public
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use onehand_core::ReservationPolicy;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::auth::TokenIssuer;
use crate::notify::Notifier;
use crate::reservation::{PgReservationStore, ReservationService};
use crate::storage::BlobStore;

/// Default upload ceiling (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Directory served read-only under `/public` (the blob store root)
    pub public_dir: Option<PathBuf>,

    /// Largest accepted request body, uploads included
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
            public_dir: None,
            max_body_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenIssuer,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub reservations: ReservationService,
    /// Page the password reset email links to
    pub reset_url: String,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        tokens: TokenIssuer,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        policy: ReservationPolicy,
    ) -> Self {
        let store = Arc::new(PgReservationStore::new(pool.clone()));
        let reservations = ReservationService::new(store, Arc::clone(&notifier), policy);
        Self {
            pool,
            tokens,
            blobs,
            notifier,
            reservations,
            reset_url: "http://127.0.0.1:3030/reset-password".to_string(),
        }
    }

    pub fn with_reset_url(mut self, url: impl Into<String>) -> Self {
        self.reset_url = url.into();
        self
    }
}

/// Assemble the full router with middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:3030"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:3030"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let mut app = Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::items::router())
        .merge(routes::reservations::router())
        .merge(routes::bookmarks::router())
        .merge(routes::bundle_requests::router())
        .merge(routes::categories::router())
        .merge(routes::uploads::router())
        .with_state(Arc::new(state));

    if let Some(dir) = &config.public_dir {
        app = app.nest_service("/public", ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}


#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::testing::{access_token, state};
    use super::*;

    fn app(dir: &std::path::Path) -> Router {
        let config = ServerConfig {
            public_dir: Some(dir.to_path_buf()),
            ..ServerConfig::default()
        };
        build_router(state(dir), &config)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
        assert_eq!(config.max_body_bytes, 5 * 1024 * 1024);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn unreserve_without_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("/items/{}/unreserve", Uuid::new_v4());
        let response = app(dir.path())
            .oneshot(Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "must be logged in");
    }

    #[tokio::test]
    async fn reserve_with_forged_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("/items/{}/reserve", Uuid::new_v4());
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn donate_with_bad_phone_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let token = access_token(Uuid::new_v4());
        let body = serde_json::json!({
            "category_id": 1,
            "description": "Wooden chair",
            "location": "Haifa",
            "phone": "call me maybe",
            "cost": 0
        });
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/items")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn me_requires_session() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_stores_image_and_serves_it() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();
        let app = app(dir.path());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/uploads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access_token(user)))
                    .header(header::CONTENT_TYPE, "image/png")
                    .body(Body::from(&b"\x89PNG\r\n\x1a\nfake"[..]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let stored = json_body(response).await;
        let path = stored["path"].as_str().unwrap().to_string();
        assert!(path.starts_with(&format!("{}/", user)));
        assert!(dir.path().join(&path).exists());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/public/{}", path))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/uploads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access_token(Uuid::new_v4())))
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn upload_over_body_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            public_dir: Some(dir.path().to_path_buf()),
            max_body_bytes: 16,
            ..ServerConfig::default()
        };
        let response = build_router(state(dir.path()), &config)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/uploads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access_token(Uuid::new_v4())))
                    .header(header::CONTENT_TYPE, "image/png")
                    .header(header::CONTENT_LENGTH, 64)
                    .body(Body::from(vec![0u8; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn password_reset_always_accepted_for_malformed_email() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/password-reset")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "not-an-email"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
