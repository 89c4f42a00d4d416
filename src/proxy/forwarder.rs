//! Verbatim forwarding to the TTS engine.
//!
//! # Responsibilities
//! - Rewrite the request URI and `Host` header to the engine's address
//! - Stream the request body out and the response body back
//! - Map connection failures to a plain-text 500
//!
//! # Design Decisions
//! - No retries: the caller owns retry and backoff
//! - Nothing is buffered, so once the response head has been returned an
//!   engine failure can only cut the body short. The server then drops the
//!   connection; no error text is ever spliced into an audio stream
//! - Dropping the handler future (caller went away) drops the outbound
//!   request and its connection with it

use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{self, InvalidHeaderValue},
        uri::{Authority, InvalidUri, PathAndQuery, Scheme},
        HeaderValue, Request, Response, Uri, Version,
    },
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::BackendConfig;
use crate::error::RelayError;

pub type HttpClient = Client<HttpConnector, Body>;

/// The configured engine address can't be used in a URI or `Host` header.
#[derive(Debug, Error)]
pub enum BackendAddressError {
    #[error("invalid backend address: {0}")]
    Authority(#[from] InvalidUri),
    #[error("invalid Host header: {0}")]
    Host(#[from] InvalidHeaderValue),
}

/// Forwards requests to a single fixed engine address.
#[derive(Clone)]
pub struct ProxyForwarder {
    client: HttpClient,
    authority: Authority,
    host_header: HeaderValue,
}

impl ProxyForwarder {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendAddressError> {
        let authority = Authority::from_str(&config.authority())?;
        let host_header = HeaderValue::from_str(authority.as_str())?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            authority,
            host_header,
        })
    }

    /// The `host:port` requests are sent to.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Forward `request` and return the engine's response as-is.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, RelayError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        parts.uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| RelayError::Upstream(e.to_string()))?;
        parts.headers.insert(header::HOST, self.host_header.clone());
        // The engine speaks HTTP/1.1 whatever the caller used.
        parts.version = Version::HTTP_11;

        let method = parts.method.clone();
        let uri = parts.uri.clone();
        tracing::debug!(method = %method, uri = %uri, "Forwarding to TTS engine");

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| {
                tracing::error!(method = %method, uri = %uri, error = %e, "TTS engine request failed");
                RelayError::Upstream(e.to_string())
            })?;

        tracing::debug!(method = %method, uri = %uri, status = %response.status(), "TTS engine responded");

        let (mut parts, body) = response.into_parts();
        // Host is a request-only header.
        parts.headers.remove(header::HOST);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_from_config() {
        let forwarder = ProxyForwarder::new(&BackendConfig::default()).unwrap();
        assert_eq!(forwarder.authority().as_str(), "127.0.0.1:5002");
        assert_eq!(forwarder.host_header, "127.0.0.1:5002");
    }

    #[test]
    fn test_rejects_bad_host() {
        let config = BackendConfig {
            host: "bad host".into(),
            ..BackendConfig::default()
        };
        assert!(ProxyForwarder::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_upstream_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let forwarder = ProxyForwarder::new(&BackendConfig {
            port,
            ..BackendConfig::default()
        })
        .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/tts")
            .body(Body::from("{\"text\":\"hi\"}"))
            .unwrap();
        let err = forwarder.forward(request).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }
}
