use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::mail::{Mailer, TemplateRenderer};
use crate::rate_limit::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mailer: Arc<Mailer>,
    pub templates: Arc<TemplateRenderer>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, mailer: Mailer) -> Self {
        let templates = TemplateRenderer::new(config.company_name.clone(), config.logo_path());
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self {
            config: Arc::new(config),
            mailer: Arc::new(mailer),
            templates: Arc::new(templates),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
