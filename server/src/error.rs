//! Error types for the AirRoute HTTP server.

use airroute_vector::VectorError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Vector(VectorError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Vector(VectorError::DimensionMismatch { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Vector(err) if err.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use airroute_vector::RouteId;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(VectorError::NotFound(RouteId(7)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Route not found or has no embedding: 7");
    }

    #[test]
    fn test_dimension_mismatch_maps_to_422() {
        let err = ApiError::from(VectorError::dimension(384, 256));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_model_errors_map_to_502() {
        assert_eq!(
            ApiError::from(VectorError::model("download failed")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(VectorError::embedding("inference failed")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_storage_errors_map_to_500() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert_eq!(
            ApiError::from(VectorError::from(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(VectorError::other("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::from(VectorError::NotFound(RouteId(1))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
