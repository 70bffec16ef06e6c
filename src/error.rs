//! Engine-wide error types.
//!
//! Four kinds, each carrying a human-readable message and, where one
//! exists, the lexical path of the offending sub-document:
//! - `Validation`: the data does not meet the schema's contract
//! - `Read`: the input cannot be parsed or is missing expected structure
//! - `Write`: a Tome holds a value the target format cannot represent
//! - `Type`: a Tome accessor was called against the wrong variant

use thiserror::Error;

/// Error type for all public scribe operations.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// The data does not follow the schema.
    #[error("validation error: {0}")]
    Validation(String),

    /// The input cannot be read or is structurally malformed.
    #[error("read error: {0}")]
    Read(String),

    /// The output cannot represent the given value.
    #[error("write error: {0}")]
    Write(String),

    /// A Tome was accessed as the wrong variant.
    #[error("type error: {0}")]
    Type(String),
}

impl ScribeError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a type error.
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Stable machine-readable code for CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "SCRIBE_VALIDATION",
            Self::Read(_) => "SCRIBE_READ",
            Self::Write(_) => "SCRIBE_WRITE",
            Self::Type(_) => "SCRIBE_TYPE",
        }
    }

    /// Process exit code mandated for the CLI: 1 for validation
    /// failures, 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 1,
            _ => 2,
        }
    }
}

impl From<std::io::Error> for ScribeError {
    fn from(e: std::io::Error) -> Self {
        Self::Read(e.to_string())
    }
}

impl From<serde_json::Error> for ScribeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Read(format!("JSON error: {}", e))
    }
}

/// Result type for scribe operations.
pub type ScribeResult<T> = Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ScribeError::validation("x").code(), "SCRIBE_VALIDATION");
        assert_eq!(ScribeError::read("x").code(), "SCRIBE_READ");
        assert_eq!(ScribeError::write("x").code(), "SCRIBE_WRITE");
        assert_eq!(ScribeError::type_error("x").code(), "SCRIBE_TYPE");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ScribeError::validation("x").exit_code(), 1);
        assert_eq!(ScribeError::read("x").exit_code(), 2);
        assert_eq!(ScribeError::write("x").exit_code(), 2);
        assert_eq!(ScribeError::type_error("x").exit_code(), 2);
    }

    #[test]
    fn test_display_includes_kind() {
        let e = ScribeError::validation("expected integer at /foo/bar");
        assert!(e.to_string().contains("validation"));
        assert!(e.to_string().contains("/foo/bar"));
    }

    #[test]
    fn test_io_error_maps_to_read() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: ScribeError = io.into();
        assert_eq!(e.code(), "SCRIBE_READ");
    }
}
