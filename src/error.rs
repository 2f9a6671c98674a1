//! Error taxonomy for the mock API.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::patch::PatchError;

/// Errors surfaced by the CRUD and spec handlers.
///
/// Unknown types and ids map to 404. Everything else maps to a generic
/// 500; callers must not rely on malformed input producing a 4xx.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The object type is not part of the loaded dataset.
    #[error("unknown object type: {0}")]
    UnknownType(String),

    /// No object with this id exists within the type.
    #[error("{object_type}/{object_id} not found")]
    ObjectNotFound {
        object_type: String,
        object_id: String,
    },

    /// The request body is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The patch document failed to parse, or produced a non-object result.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// A patch operation failed its precondition.
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownType(_) | ApiError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidDocument(_)
            | ApiError::InvalidPatch(_)
            | ApiError::Patch(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::X_CONTENT_TYPE_OPTIONS, "nosniff")],
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
