use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::Environment;
use crate::mail::MailError;

pub const GENERIC_ERROR: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body could not be extracted.
    #[error("Rejected body ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Endpoint not found")]
    NotFound,

    #[error("Too many requests")]
    TooManyRequests { retry_after: Duration },

    /// The transport refused the message. `detail` is what the caller gets to see.
    #[error("Failed to send email: {detail}")]
    SendFailed { detail: String },

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Map a transport failure, keeping its detail only where the environment allows it.
    pub fn send_failed(err: &MailError, environment: Environment) -> Self {
        let detail = if environment.exposes_error_detail() {
            err.to_string()
        } else {
            GENERIC_ERROR.to_string()
        };
        AppError::SendFailed { detail }
    }
}

/// Body shared by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Rejected { status, message } => (*status, message.clone(), None),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Endpoint not found".to_string(), None),
            AppError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests from this IP, please try again later.".to_string(),
                None,
            ),
            AppError::SendFailed { detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send email".to_string(),
                Some(detail.clone()),
            ),
            AppError::InternalError(detail) => {
                tracing::error!(error = %detail, "Server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_ERROR.to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            error,
        });

        let mut response = (status, body).into_response();
        if let AppError::TooManyRequests { retry_after } = self {
            // Round up so clients never retry a moment too early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = AppError::BadRequest("Invalid email address".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "message": "Invalid email address"})
        );
    }

    #[tokio::test]
    async fn test_send_failed_hides_detail_outside_development() {
        let err = MailError::Transport("535 authentication failed".to_string());

        let response = AppError::send_failed(&err, Environment::Production).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "message": "Failed to send email",
                "error": "Internal server error"
            })
        );

        let response = AppError::send_failed(&err, Environment::Development).into_response();
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("535 authentication failed"));
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let response = AppError::TooManyRequests {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
        assert_eq!(body_json(response).await["success"], json!(false));
    }
}
