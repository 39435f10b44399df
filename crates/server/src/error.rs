use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use catalogue_pdf::CatalogueError;

/// Error answered as a plain-text body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadGateway(msg) => {
                tracing::warn!("upstream failure: {msg}");
                (StatusCode::BAD_GATEWAY, "upstream unavailable".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, message).into_response()
    }
}

impl From<CatalogueError> for ApiError {
    fn from(e: CatalogueError) -> Self {
        match e {
            CatalogueError::BadRequest(msg) => ApiError::BadRequest(msg),
            CatalogueError::NotFound(msg) => ApiError::NotFound(msg),
            CatalogueError::UpstreamUnavailable(err) => ApiError::BadGateway(err.to_string()),
            other @ (CatalogueError::AssetUnavailable(_) | CatalogueError::Pdf(_)) => {
                ApiError::Internal(other.to_string())
            }
        }
    }
}
