//! Error types for EntityInfo.

use thiserror::Error;

/// Result type alias using EntityInfo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for EntityInfo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Manifest not found
    #[error("Manifest not found: {0}")]
    ManifestNotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authenticated but not allowed (limits, protected records)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Record already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// HTTP/network request failed before a response was received
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that originate in a collaborator service.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Request(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_manifest_not_found() {
        let err = Error::ManifestNotFound(42);
        assert_eq!(err.to_string(), "Manifest not found: 42");
    }

    #[test]
    fn test_error_display_upstream_embeds_body() {
        let err = Error::Upstream {
            service: "graph store",
            status: 502,
            body: "{\"error\":\"bad gateway\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "graph store returned 502: {\"error\":\"bad gateway\"}"
        );
        assert!(err.is_upstream());
    }

    #[test]
    fn test_error_display_forbidden_and_conflict() {
        assert_eq!(
            Error::Forbidden("Manifest limit reached".to_string()).to_string(),
            "Forbidden: Manifest limit reached"
        );
        assert_eq!(
            Error::Conflict("duplicate manifest name".to_string()).to_string(),
            "Conflict: duplicate manifest name"
        );
    }

    #[test]
    fn test_request_error_is_upstream() {
        assert!(Error::Request("connection refused".to_string()).is_upstream());
        assert!(!Error::InvalidInput("bad".to_string()).is_upstream());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
