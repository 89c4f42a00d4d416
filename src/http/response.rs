//! Response decoration.
//!
//! # Responsibilities
//! - Answer CORS preflight before routing
//! - Add permissive CORS headers to every response
//! - Tie a request slot to the lifetime of the response body
//!
//! # Design Decisions
//! - CORS headers are only added when absent, so an engine's own CORS
//!   headers pass through untouched
//! - Slots are released when the body is done, not when the head is sent,
//!   so long audio streams keep counting against the limit

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::BodyExt;
use tokio::sync::OwnedSemaphorePermit;
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// `OPTIONS` on any path is a bare 200.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "CORS preflight");
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Wrap `router` with preflight handling and CORS response headers.
pub fn with_cors(router: Router) -> Router {
    router
        .layer(middleware::from_fn(preflight))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
}

/// Hold `permit` until the response body has been dropped.
pub fn release_after_body(response: Response, permit: OwnedSemaphorePermit) -> Response {
    let (parts, body) = response.into_parts();
    let body = body.map_err(move |e| {
        let _slot = &permit;
        e
    });
    Response::from_parts(parts, Body::new(body))
}
