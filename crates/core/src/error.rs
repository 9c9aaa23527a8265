/// Error taxonomy for the analysis loggers
/// Recorders never fail; only configuration loading and export persistence can
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonLogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid run options: {reason}")]
    InvalidOptions { reason: String },

    #[error("Invalid content name: {name}")]
    InvalidContentName { name: String },
}

impl JsonLogError {
    pub fn code(&self) -> &'static str {
        match self {
            JsonLogError::Io(_) => "io",
            JsonLogError::Serialize(_) => "serialize",
            JsonLogError::InvalidOptions { .. } => "invalid_options",
            JsonLogError::InvalidContentName { .. } => "invalid_content_name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: JsonLogError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.code(), "io");
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_invalid_content_name_message() {
        let err = JsonLogError::InvalidContentName {
            name: "../escape.json".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid content name: ../escape.json");
    }
}
