use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::service::ServiceError;

use super::models::ErrorResponse;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::debug!("Responding {} ({}): {}", status, self.kind(), self);

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn from_json_rejection(rejection: JsonRejection) -> ServiceError {
    log::warn!("Rejected request body: {}", rejection.body_text());
    ServiceError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

pub fn from_path_rejection(rejection: PathRejection) -> ServiceError {
    log::warn!("Rejected request path: {}", rejection.body_text());
    ServiceError::Validation(format!("Invalid id: {}", rejection.body_text()))
}
