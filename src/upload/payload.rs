//! Upload request and receipt bodies.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard alphabet, padding optional. Browsers always pad, but hand-made
/// payloads often don't.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// JSON upload body: `{"audioData": "data:audio/wav;base64,...", "filename": "v1.wav"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub audio_data: String,
    pub filename: String,
}

/// Returned after a file is staged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub success: bool,
    pub audio_url: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("data URI has no ',' before its payload")]
    MissingPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode `audioData`: either a `data:` URI or bare base64.
///
/// Everything after the first comma of a data URI is the payload; the
/// media type is not checked. ASCII whitespace inside the payload is
/// ignored.
pub fn decode_audio_data(audio_data: &str) -> Result<Vec<u8>, PayloadError> {
    let encoded = match audio_data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or(PayloadError::MissingPayload)?,
        None => audio_data,
    };

    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(LENIENT_BASE64.decode(cleaned)?)
}

/// The media type declared by a data URI, if any.
pub fn declared_media_type(audio_data: &str) -> Option<&str> {
    let header = audio_data.strip_prefix("data:")?.split_once(',')?.0;
    let media_type = header.split(';').next()?;
    (!media_type.is_empty()).then_some(media_type)
}
