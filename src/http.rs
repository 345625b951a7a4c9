//! Axum response conversions.
//!
//! Lets route handlers return a [`Decision`] or an [`EntitlementError`]
//! directly. Errors render as `{ "error": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::EntitlementError;
use crate::subscription::Decision;

/// Error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    error_id: String,
}

impl EntitlementError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            #[cfg(feature = "seaorm")]
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EntitlementError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        // Full detail stays in the logs; clients get the safe message
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: self.safe_message(),
            error_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Allowed decisions render as 200, denials as 403, backend failures as 500.
/// The body is the decision itself in every case.
impl IntoResponse for Decision {
    fn into_response(self) -> Response {
        let status = match self.denial() {
            None => StatusCode::OK,
            Some(denial) if denial.is_server_error() => StatusCode::INTERNAL_SERVER_ERROR,
            Some(_) => StatusCode::FORBIDDEN,
        };

        (status, Json(self)).into_response()
    }
}
