use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nattygas_email_service::api;
use nattygas_email_service::config::{Config, Environment};
use nattygas_email_service::mail::Mailer;
use nattygas_email_service::rate_limit::RateLimiter;
use nattygas_email_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_tracing(config.environment);

    tracing::info!("Starting {} Email Service...", config.company_name);
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        environment = %config.environment,
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        "Configuration loaded"
    );

    let mailer = Mailer::from_config(&config.smtp)?;
    let state = AppState::new(config, mailer);

    let app = api::create_router(state.clone());

    // Start server
    let addr: SocketAddr = state.config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, environment = %state.config.environment, "Server listening");

    // Verify SMTP settings without holding up the listener
    let mailer = Arc::clone(&state.mailer);
    tokio::spawn(async move {
        match mailer.verify().await {
            Ok(()) => tracing::info!(
                transport = mailer.transport_name(),
                "Email server is ready to send messages"
            ),
            Err(e) => tracing::error!(
                error = %e,
                hint = "check the EMAIL_* settings and credentials",
                "Email configuration error"
            ),
        }
    });

    tokio::spawn(purge_rate_limits(Arc::clone(&state.rate_limiter)));

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if environment.is_production() {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Forget clients whose requests have all aged out, once per window
async fn purge_rate_limits(limiter: Arc<RateLimiter>) {
    let period = limiter.window().max(std::time::Duration::from_secs(1));
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    loop {
        interval.tick().await;
        limiter.purge_expired();
        tracing::debug!(clients = limiter.tracked_clients(), "Rate limit buckets purged");
    }
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
