pub mod message;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SmtpConfig;

pub use message::{MailMessage, Sender, SendReceipt};
pub use templates::{RenderedEmail, TemplateRenderer, WelcomeTemplateInput};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Missing sender address (EMAIL_USER)")]
    MissingSender,

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("{0}")]
    Transport(String),
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        MailError::Build(err.to_string())
    }
}

impl From<askama::Error> for MailError {
    fn from(err: askama::Error) -> Self {
        MailError::Template(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

/// Something that can deliver a [`MailMessage`].
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(&self, message: &MailMessage) -> Result<SendReceipt, MailError>;

    /// Check that the transport can reach and authenticate against its server.
    async fn verify(&self) -> Result<(), MailError>;

    fn name(&self) -> &'static str;
}

/// Mailer abstraction (SMTP in production, anything implementing
/// [`MailTransport`] elsewhere)
#[derive(Clone)]
pub struct Mailer {
    inner: Arc<dyn MailTransport>,
}

impl Mailer {
    pub fn new<T: MailTransport>(transport: T) -> Self {
        Self {
            inner: Arc::new(transport),
        }
    }

    /// Create an SMTP mailer from the process configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        Ok(Self::new(smtp::SmtpTransport::from_config(config)?))
    }

    pub async fn send(&self, message: &MailMessage) -> Result<SendReceipt, MailError> {
        self.inner.send(message).await
    }

    pub async fn verify(&self) -> Result<(), MailError> {
        self.inner.verify().await
    }

    pub fn transport_name(&self) -> &'static str {
        self.inner.name()
    }
}
