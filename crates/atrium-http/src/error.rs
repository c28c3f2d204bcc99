// SPDX-License-Identifier: Apache-2.0
//! Service taxonomy → HTTP status + envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use atrium_core::error::ErrorKind;
use atrium_core::Error;

use crate::envelope::ApiResponse;

/// Wrapper turning a service error into an enveloped HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::InputInvalid => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Invariant => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Internal breaches get logged with detail and answered generically.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "internal error");
            "internal server error".to_owned()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(ApiResponse::<()> {
                success: false,
                data: None,
                message: Some(message),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::Unauthorized("x"), StatusCode::UNAUTHORIZED),
            (Error::TenantMismatch, StatusCode::FORBIDDEN),
            (Error::NotFound("venue"), StatusCode::NOT_FOUND),
            (Error::OwnerRequired, StatusCode::CONFLICT),
            (Error::NoDraft, StatusCode::CONFLICT),
            (Error::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::DanglingEdge, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
