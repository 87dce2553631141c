//! HTTP mapping of auth failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domains::auth::AuthError;

/// Body of every failed `/auth` response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCode | AuthError::Expired | AuthError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side detail goes to the log, not the client
        let message = match &self {
            AuthError::ServiceUnavailable(source) => {
                error!(error = %source, "Storage failure");
                self.to_string()
            }
            AuthError::Internal(source) => {
                error!(error = ?source, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                ok: false,
                error: message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::StoreError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AuthError::validation("bad"), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCode, StatusCode::UNAUTHORIZED),
            (AuthError::Expired, StatusCode::UNAUTHORIZED),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
            (
                AuthError::ServiceUnavailable(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let response = AuthError::Internal(anyhow::anyhow!("secret stack detail")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Internal server error");
    }
}
