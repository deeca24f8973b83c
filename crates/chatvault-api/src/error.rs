use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use chatvault_types::AuthError;
use chatvault_types::api::ErrorBody;

/// HTTP wrapper for the auth taxonomy. Every variant maps to a status
/// and an actionable detail message; internals stay in the logs.
pub struct ApiError(AuthError);

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            AuthError::InvalidAuthPayload(_) => (StatusCode::FORBIDDEN, self.0.to_string()),
            AuthError::NoPendingLogin | AuthError::ProviderRejected(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            AuthError::ProviderRateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, self.0.to_string())
            }
            AuthError::CorruptCredential => (
                StatusCode::UNAUTHORIZED,
                "session expired, please restart login".to_string(),
            ),
            AuthError::ProviderTransient(_) | AuthError::Storage(_) => {
                error!("internal auth failure: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error, please try again".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
