//! Content type resolution for staged audio.

use std::path::Path;

/// Served for `.wav`, unknown extensions and names without one.
pub const DEFAULT_AUDIO_TYPE: &str = "audio/wav";

/// Content type for a staged file, by extension (case-insensitive).
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => DEFAULT_AUDIO_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for("v1.webm"), "audio/webm");
        assert_eq!(content_type_for("v1.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("v1.mp4"), "audio/mp4");
        assert_eq!(content_type_for("v1.ogg"), "audio/ogg");
        assert_eq!(content_type_for("V1.MP3"), "audio/mpeg");
    }

    #[test]
    fn test_everything_else_is_wav() {
        assert_eq!(content_type_for("v1.wav"), DEFAULT_AUDIO_TYPE);
        assert_eq!(content_type_for("v1.m4a"), DEFAULT_AUDIO_TYPE);
        assert_eq!(content_type_for("v1"), DEFAULT_AUDIO_TYPE);
        assert_eq!(content_type_for("archive.tar.gz"), DEFAULT_AUDIO_TYPE);
    }
}
