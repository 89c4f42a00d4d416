//! `POST` upload handling.
//!
//! Two body shapes are accepted, chosen by `Content-Type`:
//! - `multipart/form-data`: a file part plus an optional `filename` text
//!   field, streamed to disk chunk by chunk
//! - anything else: the JSON [`UploadRequest`], decoded in memory
//!
//! Both are capped by the router's `DefaultBodyLimit`.

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, FromRequest, Multipart},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::RelayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::staging::{PendingFile, StagedFile};
use crate::upload::payload::{declared_media_type, decode_audio_data, UploadReceipt, UploadRequest};

/// Multipart field names treated as the audio file even without a
/// `filename` in their disposition.
pub const FILE_FIELDS: &[&str] = &["audio", "file", "voice", "audioFile", "speaker_wav"];

/// Text field overriding the file part's own filename.
pub const FILENAME_FIELD: &str = "filename";

/// Characters escaped when a filename goes into the retrieval URL.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Stage an uploaded voice file and answer with its retrieval URL.
pub async fn handle_upload(state: &AppState, request: Request<Body>) -> Result<Response, RelayError> {
    let staged = if is_multipart(request.headers()) {
        stage_multipart(state, request).await?
    } else {
        stage_json(state, request).await?
    };

    metrics::record_upload(staged.size);
    tracing::info!(
        filename = %staged.filename,
        bytes = staged.size,
        content_type = staged.content_type,
        "Voice file staged"
    );

    let encoded = utf8_percent_encode(&staged.filename, PATH_SEGMENT).to_string();
    let receipt = UploadReceipt {
        success: true,
        audio_url: format!("{}{}", state.public_base_url, state.router.staged_path(&encoded)),
        filename: staged.filename,
        size: staged.size,
    };
    Ok(Json(receipt).into_response())
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn stage_json(state: &AppState, request: Request<Body>) -> Result<StagedFile, RelayError> {
    let body = Bytes::from_request(request, &()).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge {
                limit: state.max_upload_bytes,
            }
        } else {
            RelayError::MalformedUpload(rejection.body_text())
        }
    })?;

    let upload: UploadRequest =
        serde_json::from_slice(&body).map_err(|e| RelayError::MalformedUpload(e.to_string()))?;
    let audio = decode_audio_data(&upload.audio_data)
        .map_err(|e| RelayError::MalformedUpload(e.to_string()))?;

    tracing::debug!(
        filename = %upload.filename,
        declared_type = declared_media_type(&upload.audio_data).unwrap_or("none"),
        bytes = audio.len(),
        "Decoded JSON upload"
    );

    state.staging.write(&upload.filename, &audio).await
}

async fn stage_multipart(state: &AppState, request: Request<Body>) -> Result<StagedFile, RelayError> {
    let limit = state.max_upload_bytes;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| RelayError::MalformedUpload(rejection.body_text()))?;

    let mut requested_name: Option<String> = None;
    let mut upload: Option<(PendingFile, Option<String>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILENAME_FIELD && field.file_name().is_none() {
            let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
            requested_name = Some(text.trim().to_string());
            continue;
        }

        let is_file = field.file_name().is_some() || FILE_FIELDS.contains(&name.as_str());
        if !is_file || upload.is_some() {
            tracing::debug!(field = %name, "Ignoring form field");
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let mut pending = state.staging.begin().await?;
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            pending.write_chunk(&chunk).await?;
        }
        upload = Some((pending, original_name));
    }

    let (pending, original_name) = upload
        .ok_or_else(|| RelayError::MalformedUpload("form has no audio file part".to_string()))?;
    let filename = requested_name
        .filter(|n| !n.is_empty())
        .or(original_name)
        .ok_or_else(|| RelayError::MalformedUpload("missing filename".to_string()))?;

    pending.commit(&filename).await
}

fn multipart_error(error: MultipartError, limit: usize) -> RelayError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge { limit }
    } else {
        RelayError::MalformedUpload(error.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_multipart() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_multipart(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Multipart/Form-Data; boundary=xyz"),
        );
        assert!(is_multipart(&headers));
    }

    #[test]
    fn test_url_encoding_of_names() {
        assert_eq!(utf8_percent_encode("v1.wav", PATH_SEGMENT).to_string(), "v1.wav");
        assert_eq!(
            utf8_percent_encode("my voice#1.wav", PATH_SEGMENT).to_string(),
            "my%20voice%231.wav"
        );
    }
}
