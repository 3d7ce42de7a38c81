//! Error types for the SolveCam CLI

use std::time::Duration;
use thiserror::Error;

/// Result type alias for SolveCam operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for API client operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// API and task-protocol errors
///
/// Every failure the client can surface maps to exactly one variant, so call
/// sites can match exhaustively instead of inspecting messages.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No HTTP response was received at all.
    #[error("Network error: {0}")]
    Connectivity(String),

    #[error("Authentication required. Run `solvecam login` to sign in.")]
    Unauthorized,

    /// The server answered with an error status and (usually) a message.
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("Task {task_id} did not finish after {attempts} polls")]
    TaskTimeout { task_id: String, attempts: u32 },

    /// Malformed local input, detected before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status associated with this error; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::Server { status, .. } => *status,
            ApiError::RateLimit(_) => 429,
            _ => 0,
        }
    }

    /// Whether a single poll failing this way may be followed by another poll.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Connectivity(_) | ApiError::RateLimit(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            ApiError::Unauthorized
            | ApiError::TaskFailed { .. }
            | ApiError::TaskTimeout { .. }
            | ApiError::Validation(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Cancelled => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Connectivity("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Connectivity("Failed to connect to API".to_string())
        } else {
            ApiError::Connectivity(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Local response cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_unauthorized_message() {
        let err = ApiError::Unauthorized;
        assert!(err.to_string().contains("solvecam login"));
        assert_eq!(err.status(), 401);
    }

    #[test]
    fn test_api_error_server_passes_message_through() {
        let err = ApiError::Server {
            status: 422,
            message: "Image is too blurry".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Image is too blurry"));
        assert!(msg.contains("422"));
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn test_api_error_connectivity_has_status_zero() {
        let err = ApiError::Connectivity("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn test_api_error_rate_limit() {
        let err = ApiError::RateLimit(Duration::from_secs(30));
        let msg = err.to_string();
        assert!(msg.contains("Rate limit"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_task_errors_name_the_task() {
        let failed = ApiError::TaskFailed {
            task_id: "t9".to_string(),
            message: "unreadable handwriting".to_string(),
        };
        assert!(failed.to_string().contains("t9"));
        assert!(failed.to_string().contains("unreadable handwriting"));

        let timeout = ApiError::TaskTimeout {
            task_id: "t9".to_string(),
            attempts: 5,
        };
        assert!(timeout.to_string().contains("5 polls"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Connectivity("reset".into()).is_transient());
        assert!(ApiError::RateLimit(Duration::from_secs(1)).is_transient());
        assert!(
            ApiError::Server {
                status: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            !ApiError::Server {
                status: 404,
                message: "no such task".into()
            }
            .is_transient()
        );
        assert!(!ApiError::Unauthorized.is_transient());
        assert!(!ApiError::Validation("missing file".into()).is_transient());
        assert!(!ApiError::Cancelled.is_transient());
    }

    #[test]
    fn test_config_error_parse() {
        let err = ConfigError::ParseError("unexpected key".to_string());
        assert!(err.to_string().contains("unexpected key"));
    }

    #[test]
    fn test_config_error_save() {
        let err = ConfigError::SaveError("disk full".to_string());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_from_api_error() {
        let err: Error = ApiError::Unauthorized.into();

        match err {
            Error::Api(ApiError::Unauthorized) => (),
            _ => panic!("Expected Error::Api(ApiError::Unauthorized)"),
        }
    }

    #[test]
    fn test_error_from_cache_error() {
        let err: Error = CacheError::NoHome.into();
        assert!(err.to_string().contains("cache directory"));
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
