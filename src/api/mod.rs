use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::registry::error::IdentityError;

pub mod update;
pub mod users;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Request body is not a JSON object: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid user id: {0}")]
    InvalidId(#[from] IdentityError),
    #[error("Only POST is accepted")]
    MethodNotAllowed,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "InvalidJson",
            ApiError::InvalidId(_) => "InvalidId",
            ApiError::MethodNotAllowed => "MethodNotAllowed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Rejected request");
        (
            self.status(),
            Json(ErrorResponse::new(self.kind(), &self.to_string())),
        )
            .into_response()
    }
}
