use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};

use super::health::timestamp;
use crate::error::{AppError, Result};
use crate::mail::MailMessage;
use crate::models::{EmailContent, EmailRequest, SendEmailResponse};
use crate::state::AppState;

/// Send-email body, accepted as JSON or as a url-encoded form.
pub struct EmailBody(pub EmailRequest);

impl<S> FromRequest<S> for EmailBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<EmailRequest>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::Rejected {
                    status: rejection.status(),
                    message: rejection.body_text(),
                })?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<EmailRequest>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::Rejected {
                    status: rejection.status(),
                    message: rejection.body_text(),
                })?;
            Ok(Self(body))
        }
    }
}

/// POST /api/send-email - Validate, render if requested, then relay over the mailer
pub async fn send_email(
    State(state): State<AppState>,
    EmailBody(request): EmailBody,
) -> Result<Json<SendEmailResponse>> {
    let email = request.validate()?;

    let (text, html) = match email.content {
        EmailContent::Welcome(input) => {
            let rendered = state
                .templates
                .render_welcome(&input)
                .map_err(|err| AppError::InternalError(err.to_string()))?;
            (Some(rendered.text), Some(rendered.html))
        }
        EmailContent::Raw { text, html } => (text, html),
    };

    let message = MailMessage::from_config(&state.config, email.to, email.subject, text, html);
    let to = message.to.clone();

    // Run the send on its own task so a caller hanging up does not abort it.
    let mailer = Arc::clone(&state.mailer);
    let outcome = tokio::spawn(async move { mailer.send(&message).await })
        .await
        .map_err(|err| AppError::InternalError(format!("Send task failed: {}", err)))?;

    let receipt = outcome.map_err(|err| {
        tracing::error!(to = %to, error = %err, "Error sending email");
        AppError::send_failed(&err, state.config.environment)
    })?;

    tracing::info!(to = %to, message_id = %receipt.message_id, "Email sent successfully");

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        message_id: receipt.message_id,
        timestamp: timestamp(),
    }))
}
