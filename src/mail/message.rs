use serde::Serialize;

use crate::config::Config;

pub const X_PRIORITY_NORMAL: u8 = 3;

/// Display name and address the mail is sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: Option<String>,
}

/// A single outbound mail. Built per request, sent once and dropped.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub from: Sender,
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    /// `X-Mailer` header value.
    pub mailer: String,
    /// `X-Priority` header value.
    pub priority: u8,
}

impl MailMessage {
    /// Message addressed from the configured company and SMTP user.
    pub fn from_config(
        config: &Config,
        to: String,
        subject: String,
        text: Option<String>,
        html: Option<String>,
    ) -> Self {
        Self {
            from: Sender {
                name: config.company_name.clone(),
                address: config.smtp.user.clone(),
            },
            to,
            subject,
            text,
            html,
            mailer: format!("{} Email Service", config.company_name),
            priority: X_PRIORITY_NORMAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: String,
}
