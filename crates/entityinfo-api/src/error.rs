//! API error type and its mapping from core errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::envelope::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<entityinfo_core::Error> for ApiError {
    fn from(err: entityinfo_core::Error) -> Self {
        use entityinfo_core::Error;
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::ManifestNotFound(_) => ApiError::NotFound("Manifest not found".to_string()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                ApiError::Internal(msg)
            }
            Error::Internal(msg) => ApiError::Internal(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(subsystem = "api", error = %self, "Request failed");
        }
        ApiResponse::error(status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entityinfo_core::Error;

    #[test]
    fn test_core_error_mapping() {
        assert_eq!(
            ApiError::from(Error::InvalidInput("text too long".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::ManifestNotFound(4)).to_string(),
            "Manifest not found"
        );
        assert_eq!(
            ApiError::from(Error::Forbidden("Manifest limit reached".into())).status(),
            StatusCode::FORBIDDEN
        );
        let upstream = ApiError::from(Error::Upstream {
            service: "graph store",
            status: 502,
            body: "bad gateway".into(),
        });
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(upstream.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_internal_keeps_message() {
        let err = ApiError::from(Error::Internal("Elastic Search Error: {}".into()));
        assert_eq!(err.to_string(), "Elastic Search Error: {}");
    }
}
