//! SMTP transport using lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Mailbox, MultiPart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use super::{MailError, MailMessage, MailTransport, SendReceipt};
use crate::config::SmtpConfig;

/// `X-Mailer` header.
#[derive(Debug, Clone)]
struct XMailer(String);

impl Header for XMailer {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Mailer")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// `X-Priority` header (1 highest, 5 lowest).
#[derive(Debug, Clone)]
struct XPriority(u8);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.trim().parse()?))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.to_string())
    }
}

/// SMTP transport configured once from [`SmtpConfig`].
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| MailError::Tls(e.to_string()))?;

        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        if config.accept_invalid_certs {
            tracing::warn!(host = %config.host, "SMTP certificate validation is disabled");
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
        })
    }
}

/// Build the lettre message and the `Message-ID` assigned to it.
pub fn build_message(message: &MailMessage) -> Result<(Message, String), MailError> {
    let sender = message
        .from
        .address
        .as_deref()
        .ok_or(MailError::MissingSender)?;
    let sender: Address = sender
        .parse()
        .map_err(|_| MailError::InvalidAddress(sender.to_string()))?;
    let recipient: Mailbox = message
        .to
        .parse()
        .map_err(|_| MailError::InvalidAddress(message.to.clone()))?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), sender.domain());

    let builder = Message::builder()
        .from(Mailbox::new(Some(message.from.name.clone()), sender))
        .to(recipient)
        .subject(message.subject.clone())
        .message_id(Some(message_id.clone()))
        .header(XMailer(message.mailer.clone()))
        .header(XPriority(message.priority));

    let email = match (&message.html, &message.text) {
        (Some(html), Some(text)) => {
            builder.multipart(MultiPart::alternative_plain_html(text.clone(), html.clone()))?
        }
        (Some(html), None) => builder.header(ContentType::TEXT_HTML).body(html.clone())?,
        (None, Some(text)) => builder.header(ContentType::TEXT_PLAIN).body(text.clone())?,
        (None, None) => builder.header(ContentType::TEXT_PLAIN).body(String::new())?,
    };

    Ok((email, message_id))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &MailMessage) -> Result<SendReceipt, MailError> {
        let (email, message_id) = build_message(message)?;

        let response = self.transport.send(email).await?;
        tracing::debug!(code = %response.code(), message_id = %message_id, "SMTP server accepted message");

        Ok(SendReceipt { message_id })
    }

    async fn verify(&self) -> Result<(), MailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::Transport(format!(
                "SMTP server {} did not accept the connection",
                self.host
            )))
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
