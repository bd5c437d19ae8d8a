use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_COMPANY_NAME: &str = "NattyGas Lab";

const PRODUCTION_ORIGINS: &[&str] = &["https://nattygaslab-email-api.onrender.com", "*"];
const DEVELOPMENT_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Deployment environment, taken from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    Production,
    /// Unset or any other name.
    #[default]
    Unspecified,
}

impl Environment {
    /// Only the exact names `development` and `production` are recognised.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            _ => Environment::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Unspecified => "unspecified",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Transport error details are only returned to callers in development.
    pub fn exposes_error_detail(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn default_cors_origins(&self) -> Vec<String> {
        let origins = if self.is_production() {
            PRODUCTION_ORIGINS
        } else {
            DEVELOPMENT_ORIGINS
        };
        origins.iter().map(|o| o.to_string()).collect()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound SMTP settings, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS from the first byte. When false the connection is upgraded
    /// with STARTTLS if the server offers it.
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Accept self-signed or otherwise invalid server certificates.
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "<redacted>"))
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub environment: Environment,
    pub company_name: String,
    pub smtp: SmtpConfig,
    pub cors_origins: Vec<String>,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub public_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::from_name(var("NODE_ENV").as_deref());
        let secure = var("EMAIL_SECURE").as_deref() == Some("true");

        let smtp = SmtpConfig {
            host: var("EMAIL_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: match var("EMAIL_PORT") {
                Some(port) => port.trim().parse().map_err(|_| ConfigError::InvalidSmtpPort)?,
                None if secure => 465,
                None => 587,
            },
            secure,
            user: var("EMAIL_USER"),
            pass: var("EMAIL_PASS"),
            accept_invalid_certs: var("EMAIL_TLS_ACCEPT_INVALID_CERTS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            timeout_secs: var("EMAIL_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60),
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => environment.default_cors_origins(),
        };

        Ok(Config {
            server_host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: var("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            environment,
            company_name: var("COMPANY_NAME").unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            smtp,
            cors_origins,
            rate_limit_max_requests: var("RATE_LIMIT_MAX")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(100),
            rate_limit_window_secs: var("RATE_LIMIT_WINDOW_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(15 * 60),
            public_dir: var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Location of the optional logo embedded in templated mail.
    pub fn logo_path(&self) -> PathBuf {
        self.public_dir.join("images").join("logo.png")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("Invalid EMAIL_PORT")]
    InvalidSmtpPort,
}
