use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        if self.is_retryable() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = ?self, "Request rejected");
        }

        let code = self.code();
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::InvalidRange(_)
            | AppError::PastDate
            | AppError::CutoffExceeded { .. }
            | AppError::InvalidInput(_) => {
                let message = self.to_string();
                error_resp(StatusCode::BAD_REQUEST, code, Some(message))
            }
            AppError::DuplicatePause | AppError::Conflict(_) => {
                let message = self.to_string();
                error_resp(StatusCode::CONFLICT, code, Some(message))
            }
            AppError::NotFound | AppError::PauseNotFound => {
                error_resp(StatusCode::NOT_FOUND, code, None)
            }
            AppError::InvalidSignature => error_resp(StatusCode::UNAUTHORIZED, code, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
