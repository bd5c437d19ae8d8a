pub mod api;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod rate_limit;
pub mod security;
pub mod state;

pub use config::{Config, Environment, SmtpConfig};
pub use error::{AppError, Result};
pub use mail::{MailTransport, Mailer};
pub use state::AppState;
