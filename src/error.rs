use std::fmt;
use std::sync::Arc;

/// Errors surfaced by the client.
///
/// Cloneable so that every caller coalesced onto a single in-flight token
/// exchange can receive the same outcome; inner error types that are not
/// `Clone` are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub enum Error {
    Config(String),
    Validation(String),
    Transport(Arc<reqwest::Error>),
    Protocol(u16),
    Json(Arc<serde_json::Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Transport(err) => write!(f, "Transport error: {}", err),
            Error::Protocol(status) => write!(f, "Unsupported status code {}", status),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(err) => Some(err.as_ref()),
            Error::Json(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_includes_status_code() {
        let err = Error::Protocol(503);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_config_and_validation_display() {
        let err = Error::Config("'client_id' not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: 'client_id' not set");

        let err = Error::Validation("'module_id' not set".to_string());
        assert_eq!(err.to_string(), "Validation error: 'module_id' not set");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json(_)));

        // Coalesced callers each get a clone of the same error.
        let clone = err.clone();
        assert!(matches!(clone, Error::Json(_)));
    }
}
