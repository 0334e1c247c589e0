use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::models::SrsError;

impl SrsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SrsError::NotFound { .. } | SrsError::UserNotFound(_) | SrsError::WordNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SrsError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SrsError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SrsError::Conflict { .. } => StatusCode::CONFLICT,
            SrsError::CorruptRecord(_) | SrsError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SrsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            SrsError::Database(e) => {
                log::error!("Database error: {}", e);
                format!("Database error: {}", e)
            }
            SrsError::CorruptRecord(_) => {
                log::error!("{}", self);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "error": message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
