//! Caller-supplied filename checks.
//!
//! Staged files live flat in one directory, so a valid name is a single
//! path component that cannot climb out of it or collide with the
//! in-flight temporary files (which are hidden).

use thiserror::Error;

/// Longest accepted filename, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FilenameError {
    #[error("filename is empty")]
    Empty,
    #[error("filename must not be '.' or '..'")]
    DotSegment,
    #[error("filename is longer than 255 bytes")]
    TooLong,
    #[error("filename must not contain path separators")]
    PathSeparator,
    #[error("filename must not contain control characters")]
    ControlCharacter,
    #[error("filename must not start with '.'")]
    Hidden,
}

/// Accept `name` as a staged filename or say why not.
pub fn validate_filename(name: &str) -> Result<&str, FilenameError> {
    if name.is_empty() {
        return Err(FilenameError::Empty);
    }
    if name == "." || name == ".." {
        return Err(FilenameError::DotSegment);
    }
    if name.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }
    if name.contains(['/', '\\']) {
        return Err(FilenameError::PathSeparator);
    }
    if name.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }
    if name.starts_with('.') {
        return Err(FilenameError::Hidden);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["v1.wav", "voice_1712345678901.webm", "my voice.mp3", "no-extension", "a..b.ogg"] {
            assert_eq!(validate_filename(name), Ok(name));
        }
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(validate_filename(".."), Err(FilenameError::DotSegment));
        assert_eq!(validate_filename("."), Err(FilenameError::DotSegment));
        assert_eq!(validate_filename("../etc/passwd"), Err(FilenameError::PathSeparator));
        assert_eq!(validate_filename("a/b.wav"), Err(FilenameError::PathSeparator));
        assert_eq!(validate_filename("..\\evil.wav"), Err(FilenameError::PathSeparator));
        assert_eq!(validate_filename("/abs.wav"), Err(FilenameError::PathSeparator));
    }

    #[test]
    fn test_rejects_odd_names() {
        assert_eq!(validate_filename(""), Err(FilenameError::Empty));
        assert_eq!(validate_filename(".hidden.wav"), Err(FilenameError::Hidden));
        assert_eq!(validate_filename("nul\0.wav"), Err(FilenameError::ControlCharacter));
        assert_eq!(validate_filename("line\nbreak.wav"), Err(FilenameError::ControlCharacter));
        assert_eq!(validate_filename(&"a".repeat(256)), Err(FilenameError::TooLong));
        assert!(validate_filename(&"a".repeat(255)).is_ok());
    }
}
