//! Serves staged files back to clients.

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
    response::Response,
};
use tokio_util::io::ReaderStream;

use crate::error::RelayError;
use crate::staging::store::StagingArea;

/// Stream a staged file with its content type and length.
///
/// No range support: every hit is a full 200. `HEAD` gets headers only.
pub async fn serve_staged_file(
    staging: &StagingArea,
    filename: &str,
    method: &Method,
) -> Result<Response, RelayError> {
    let (file, staged) = staging.open(filename).await?;

    tracing::debug!(
        filename = %staged.filename,
        size = staged.size,
        content_type = staged.content_type,
        "Serving staged file"
    );

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(ReaderStream::new(file))
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, staged.content_type)
        .header(header::CONTENT_LENGTH, staged.size)
        .body(body)
        .map_err(|e| RelayError::Storage(std::io::Error::other(e)))
}
