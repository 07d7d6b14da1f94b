use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;

use crate::backend::domain::BudgetError;

impl BudgetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BudgetError::Validation(_) => StatusCode::BAD_REQUEST,
            BudgetError::NotSignedIn => StatusCode::UNAUTHORIZED,
            BudgetError::Superseded => StatusCode::CONFLICT,
            BudgetError::RemoteWrite(_) | BudgetError::RemoteRead(_) => StatusCode::BAD_GATEWAY,
            BudgetError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            retryable: self.is_transient(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Error body for failures detected in the handler itself
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
        retryable: false,
    };
    (status, Json(body)).into_response()
}
