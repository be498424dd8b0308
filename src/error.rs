use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid feature vector: {0}")]
    InvalidFeatureVector(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Explanation unavailable: {0}")]
    ExplainerUnavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Wire error body: a single human-readable cause, nothing internal.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidFeatureVector(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::ModelUnavailable(_) | AppError::ExplainerUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::ArtifactNotFound(_)
            | AppError::ArtifactCorrupt(_)
            | AppError::SchemaMismatch(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement conversions from other error types
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ArtifactCorrupt(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
