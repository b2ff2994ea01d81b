use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    response::{ApiResponse, Meta},
    services::image_service::ImageStoreError,
};

const SERVER_FAULT_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence error")]
    Persistence(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            // An id segment that does not parse cannot name an existing record.
            PathRejection::FailedToDeserializePathParams(err) => {
                tracing::debug!(error = %err.body_text(), "unparsable path parameter");
                AppError::NotFound
            }
            other => AppError::Validation(other.body_text()),
        }
    }
}

impl From<ImageStoreError> for AppError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::NotFound => AppError::NotFound,
            ImageStoreError::Empty | ImageStoreError::UnsupportedContentType(_) => {
                AppError::Validation(err.to_string())
            }
            ImageStoreError::Storage(db) => AppError::Persistence(db),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        // Server faults never expose their source in the body.
        let message = if status.is_server_error() {
            SERVER_FAULT_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_faults_are_server_errors() {
        let err = AppError::from(ImageStoreError::Storage(sea_orm::DbErr::Custom(
            "disk full".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejected_uploads_are_validation_errors() {
        let err = AppError::from(ImageStoreError::UnsupportedContentType("text/plain".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn unknown_image_is_not_found() {
        let err = AppError::from(ImageStoreError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
