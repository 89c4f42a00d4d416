//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing, CORS, timeout, body limit)
//! - Bind server to listener
//! - Dispatch requests to the proxy, upload or staged-file handler
//! - Start the staging retention sweeper
//! - Observability (metrics, request-scoped logs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::ValidationError;
use crate::config::{ConfigError, RelayConfig};
use crate::error::RelayError;
use crate::http::{request, response};
use crate::observability::metrics;
use crate::proxy::ProxyForwarder;
use crate::routing::{RouteKind, Router as RouteTable};
use crate::staging::relay::serve_staged_file;
use crate::staging::retention::RetentionSweeper;
use crate::staging::StagingArea;
use crate::upload;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RouteTable>,
    pub forwarder: ProxyForwarder,
    pub staging: Arc<StagingArea>,
    /// Scheme, host and port used in upload receipts, no trailing slash.
    pub public_base_url: Arc<str>,
    pub max_upload_bytes: usize,
    /// One permit per request being served.
    pub slots: Arc<Semaphore>,
}

/// HTTP server for the voice relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    staging: Arc<StagingArea>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        let forwarder = ProxyForwarder::new(&config.backend).map_err(|e| {
            ConfigError::Validation(vec![ValidationError::new("backend.host", e.to_string())])
        })?;
        let staging = Arc::new(StagingArea::new(config.staging.directory.clone()));

        let state = AppState {
            router: Arc::new(RouteTable::from_config(&config.routes)),
            forwarder,
            staging: staging.clone(),
            public_base_url: config.listener.public_base_url().into(),
            max_upload_bytes: config.staging.max_upload_bytes,
            slots: Arc::new(Semaphore::new(config.listener.max_connections)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            staging,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.staging.max_upload_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        response::with_cors(router)
            .layer(TraceLayer::new_for_http().make_span_with(request::make_request_span))
            .layer(request::propagate_request_id_layer())
            .layer(request::set_request_id_layer())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.authority(),
            staging_dir = %self.staging.root().display(),
            public_url = %self.config.listener.public_base_url(),
            "HTTP server starting"
        );

        if let Some(sweeper) = RetentionSweeper::from_config(self.staging.clone(), &self.config.staging) {
            tokio::spawn(sweeper.run(shutdown.resubscribe()));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Main handler.
/// Looks up the route and hands the request to its handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let permit = match state.slots.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            metrics::record_request("none", method.as_str(), 503, start_time);
            return RelayError::Overloaded.into_response();
        }
    };

    let route = state.router.match_request(&request);
    let label = route.map(|r| r.as_str()).unwrap_or("none");

    let result = match route {
        Some(RouteKind::Proxy) => state.forwarder.forward(request).await,
        Some(RouteKind::Upload) => upload::handle_upload(&state, request).await,
        Some(RouteKind::StagedFile) => match state.router.staged_filename(&path) {
            Some(filename) => serve_staged_file(&state.staging, &filename, &method).await,
            None => Err(RelayError::FileNotFound),
        },
        None => {
            tracing::warn!(method = %method, path = %path, "No route matched");
            Err(RelayError::RouteNotFound)
        }
    };

    let response = result.unwrap_or_else(|e| e.into_response());
    let status = response.status();

    metrics::record_request(label, method.as_str(), status.as_u16(), start_time);
    tracing::debug!(
        route = label,
        status = %status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request handled"
    );

    response::release_after_body(response, permit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method, StatusCode};
    use tower::ServiceExt;

    fn server(staging_dir: &std::path::Path) -> HttpServer {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "127.0.0.1:3001".into();
        config.staging.directory = staging_dir.to_path_buf();
        HttpServer::new(config).unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> Response {
        router.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404_with_cors() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            server(dir.path()).router(),
            Request::builder().uri("/nope").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Not found");
    }

    #[tokio::test]
    async fn test_options_never_reaches_handlers() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            server(dir.path()).router(),
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/upload-voice")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let router = server(dir.path()).router();

        let response = send(
            router.clone(),
            Request::builder()
                .method(Method::POST)
                .uri("/upload-voice")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"audioData": "data:audio/wav;base64,AAAA", "filename": "v1.wav"}"#,
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let receipt: upload::UploadReceipt = serde_json::from_slice(&body).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.audio_url, "http://127.0.0.1:3001/temp_voices/v1.wav");

        let response = send(
            router,
            Request::builder().uri("/temp_voices/v1.wav").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &[0, 0, 0]);
    }

    #[tokio::test]
    async fn test_busy_server_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.staging.directory = dir.path().to_path_buf();
        config.listener.max_connections = 1;
        let server = HttpServer::new(config).unwrap();

        // A response whose body is still alive keeps its slot.
        let held = send(
            server.router(),
            Request::builder().uri("/nope").body(Body::empty()).unwrap(),
        )
        .await;

        let response = send(
            server.router(),
            Request::builder().uri("/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        drop(held);
        let response = send(
            server.router(),
            Request::builder().uri("/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_backend_is_config_error() {
        let mut config = RelayConfig::default();
        config.backend.host = "bad host".into();
        assert!(matches!(HttpServer::new(config), Err(ConfigError::Validation(_))));
    }
}
