//! JSON error responses in the website's `{success: false, error}` shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use tracing::error;

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a message the client can show.
    BadRequest(String),
    /// 401 from the admin guard.
    Unauthorized,
    /// 500; the cause is logged, the client only sees "Server error".
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn invalid_action() -> Self {
        Self::bad_request("Invalid action")
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => message,
            Self::Unauthorized => "not authenticated".to_string(),
            Self::Internal(cause) => {
                error!(error = %cause, "request failed");
                "Server error".to_string()
            },
        };
        (
            status,
            Json(serde_json::json!({ "success": false, "error": message })),
        )
            .into_response()
    }
}

impl From<buran_chat::Error> for ApiError {
    fn from(e: buran_chat::Error) -> Self {
        if e.is_client_error() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Internal(e.to_string())
        }
    }
}

impl From<buran_leads::Error> for ApiError {
    fn from(e: buran_leads::Error) -> Self {
        if e.is_validation() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Internal(e.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_validation_maps_to_400() {
        let err: ApiError = buran_chat::Error::validation("Message is required").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failure_maps_to_500() {
        let err: ApiError = buran_chat::Error::Store(buran_messages::Error::message("disk full")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = buran_leads::Error::MissingField { field: "phone" }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
