use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use reel_core::errors::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Wrapper so the core error can be turned into an HTTP response here
/// (orphan rules keep `IntoResponse` out of `reel-core`).
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0 {
            Error::MethodNotAllowed(method) => (
                status,
                [(header::ALLOW, "GET")],
                Json(ErrorResponse::new(format!("Method {method} Not Allowed"))),
            )
                .into_response(),
            Error::BadRequest(msg) => (
                status,
                Json(ErrorResponse::new("Invalid query string.").with_details(msg)),
            )
                .into_response(),
            Error::Config(msg) => {
                tracing::error!(error = %msg, "server configuration error");
                (status, Json(ErrorResponse::new("Server configuration error."))).into_response()
            }
            e if e.is_upstream() => {
                tracing::error!(error = %e, "upstream communication failure");
                (
                    status,
                    Json(
                        ErrorResponse::new("Failed to fetch videos from Telegram.")
                            .with_details(e.detail()),
                    ),
                )
                    .into_response()
            }
            e => {
                tracing::error!(error = %e, "video listing failed");
                (
                    status,
                    Json(ErrorResponse::new("Failed to process videos.").with_details(e.detail())),
                )
                    .into_response()
            }
        }
    }
}
