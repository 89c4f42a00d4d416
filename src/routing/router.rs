//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the handler kind for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over a handful of routes
//! - Explicit NoMatch rather than silent default

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{Method, Request};
use percent_encoding::percent_decode_str;

use crate::config::RouteConfig;
use crate::routing::matcher::{AndMatcher, ExactPathMatcher, Matcher, MethodMatcher, PathPrefixMatcher};

/// The handler a request is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Forwarded verbatim to the TTS engine.
    Proxy,
    /// Voice upload into the staging directory.
    Upload,
    /// Read back of a staged file.
    StagedFile,
}

impl RouteKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Proxy => "proxy",
            RouteKind::Upload => "upload",
            RouteKind::StagedFile => "staged_file",
        }
    }
}

#[derive(Debug)]
struct Route {
    kind: RouteKind,
    matcher: Box<dyn Matcher>,
}

/// Compiled route table. First match wins.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    staging_prefix: String,
}

impl Router {
    /// Compile the route table from configuration.
    pub fn from_config(config: &RouteConfig) -> Self {
        let routes = vec![
            Route {
                kind: RouteKind::Proxy,
                matcher: Box::new(ExactPathMatcher::new(config.proxy_paths.iter().cloned())),
            },
            Route {
                kind: RouteKind::Upload,
                matcher: Box::new(AndMatcher::new(vec![
                    Box::new(ExactPathMatcher::new([config.upload_path.clone()])),
                    Box::new(MethodMatcher::new(Method::POST)),
                ])),
            },
            Route {
                kind: RouteKind::StagedFile,
                matcher: Box::new(PathPrefixMatcher::new(config.staging_prefix.clone())),
            },
        ];

        tracing::debug!(
            proxy_paths = ?config.proxy_paths,
            upload_path = %config.upload_path,
            staging_prefix = %config.staging_prefix,
            "Route table compiled"
        );

        Self {
            routes,
            staging_prefix: config.staging_prefix.clone(),
        }
    }

    /// Find the handler for a request, or `None` when nothing matches.
    pub fn match_request(&self, req: &Request<Body>) -> Option<RouteKind> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(req))
            .map(|route| route.kind)
    }

    /// The percent-decoded filename part of a staged-file path.
    ///
    /// Returns `None` when the path is outside the staging prefix or does
    /// not decode to UTF-8. The result is not yet sanitized.
    pub fn staged_filename<'a>(&self, path: &'a str) -> Option<Cow<'a, str>> {
        let raw = path.strip_prefix(&self.staging_prefix)?;
        percent_decode_str(raw).decode_utf8().ok()
    }

    /// Path under which a staged file is served.
    pub fn staged_path(&self, filename: &str) -> String {
        format!("{}{}", self.staging_prefix, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::default())
            .unwrap()
    }

    fn router() -> Router {
        Router::from_config(&RouteConfig::default())
    }

    #[test]
    fn test_routing_table() {
        let router = router();

        for path in ["/api/tts", "/api/tts/speaker-similarity", "/api/tts/info", "/health"] {
            assert_eq!(router.match_request(&request(Method::GET, path)), Some(RouteKind::Proxy));
            assert_eq!(router.match_request(&request(Method::POST, path)), Some(RouteKind::Proxy));
        }

        assert_eq!(
            router.match_request(&request(Method::POST, "/upload-voice")),
            Some(RouteKind::Upload)
        );
        assert_eq!(
            router.match_request(&request(Method::GET, "/temp_voices/v1.wav")),
            Some(RouteKind::StagedFile)
        );
        assert_eq!(
            router.match_request(&request(Method::DELETE, "/temp_voices/v1.wav")),
            Some(RouteKind::StagedFile)
        );
    }

    #[test]
    fn test_no_match() {
        let router = router();

        assert_eq!(router.match_request(&request(Method::GET, "/")), None);
        assert_eq!(router.match_request(&request(Method::GET, "/upload-voice")), None);
        assert_eq!(router.match_request(&request(Method::GET, "/api/tts/unknown")), None);
        assert_eq!(router.match_request(&request(Method::GET, "/temp_voices")), None);
    }

    #[test]
    fn test_staged_filename() {
        let router = router();

        assert_eq!(router.staged_filename("/temp_voices/v1.wav").as_deref(), Some("v1.wav"));
        assert_eq!(
            router.staged_filename("/temp_voices/my%20voice.webm").as_deref(),
            Some("my voice.webm")
        );
        assert_eq!(router.staged_filename("/temp_voices/").as_deref(), Some(""));
        assert_eq!(router.staged_filename("/other/v1.wav"), None);
        assert_eq!(router.staged_filename("/temp_voices/%FF.wav"), None);
        assert_eq!(router.staged_path("v1.wav"), "/temp_voices/v1.wav");
    }
}
