//! REST API module.
//!
//! Every handler answers with the `{success, data, revisionId}` envelope.

mod auth;
mod categories;
mod entries;
mod revision;
mod rooms;
mod stats;
mod tags;
mod timers;
mod users;

pub use auth::*;
pub use categories::*;
pub use entries::*;
pub use revision::*;
pub use rooms::*;
pub use stats::*;
pub use tags::*;
pub use timers::*;
pub use users::*;

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Parse a JSON body that may be absent. An empty body yields `T::default()`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Trimmed value, or a validation error naming `field` when blank.
pub(crate) fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeleteConfirmation, StopTimerRequest};

    #[test]
    fn test_optional_json_defaults_on_empty_body() {
        let parsed: StopTimerRequest = optional_json(&Bytes::from_static(b"")).unwrap();
        assert!(parsed.duration.is_none());

        let parsed: DeleteConfirmation =
            optional_json(&Bytes::from_static(br#"{"confirmation":"delete this tag"}"#)).unwrap();
        assert!(parsed.matches("delete this tag"));

        let bad: Result<DeleteConfirmation, _> = optional_json(&Bytes::from_static(b"{oops"));
        assert!(matches!(bad, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  Focus ", "Name").unwrap(), "Focus");
        assert!(matches!(required("   ", "Name"), Err(AppError::Validation(_))));
    }
}
