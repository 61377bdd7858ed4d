use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{ success: true, data, message? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.to_string()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Validation(Vec<FieldError>),
    NotFound(String),
    Unauthorized,
    Forbidden,
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::BadRequest(message) | Self::NotFound(message) => json!({ "message": message }),
            Self::Unauthorized => json!({ "message": "Authentication required" }),
            Self::Forbidden => json!({ "message": "Not allowed for this role" }),
            Self::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                json!({ "message": "Server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<domain::Error> for ApiError {
    fn from(err: domain::Error) -> Self {
        match err {
            domain::Error::NotFound { entity } => Self::NotFound(format!("{entity} not found")),
            domain::Error::Validation { message } => Self::BadRequest(message),
            err @ domain::Error::Uniqueness { .. } => Self::BadRequest(err.to_string()),
            domain::Error::Storage { message } => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_classes() {
        let not_found: ApiError = domain::Error::not_found("Patient").into();
        assert_eq!(not_found, ApiError::NotFound("Patient not found".to_string()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad: ApiError = domain::Error::validation("Provide patient or date and token").into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let storage: ApiError = domain::Error::storage("table unavailable").into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn responses_carry_the_status() {
        let response = ApiError::Validation(vec![FieldError::new("items", "required")]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiResponse::ok(vec![1, 2]).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::with_message("x", "Saved")).unwrap();
        assert_eq!(body, json!({ "success": true, "data": "x", "message": "Saved" }));

        let body = serde_json::to_value(ApiResponse::ok(3)).unwrap();
        assert_eq!(body, json!({ "success": true, "data": 3 }));
    }
}
