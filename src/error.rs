//! Caller-visible error taxonomy.
//!
//! Collaborator failures never reach here — strategies absorb them as
//! "no result". What remains is input rejection, contract errors (unknown
//! session), and genuine internal faults.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Unsupported file type: {0}. Use PDF, JPEG, or PNG.")]
    UnsupportedFileType(String),

    #[error("No file uploaded")]
    EmptyUpload,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntakeError {
    fn status(&self) -> StatusCode {
        match self {
            IntakeError::UnsupportedFileType(_) | IntakeError::EmptyUpload => {
                StatusCode::BAD_REQUEST
            }
            IntakeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
