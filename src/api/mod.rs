pub mod email;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::rate_limit;
use crate::security;
use crate::state::AppState;

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(health::service_info))
        .nest("/api", api_routes(state.clone()))
        .nest_service("/public", ServeDir::new(&state.config.public_dir))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(security::cors_layer(&state.config.cors_origins));

    security::with_security_headers(router)
        .layer(CatchPanicLayer::custom(security::handle_panic))
        .with_state(state)
}

/// Rate-limited API routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/send-email", post(email::send_email))
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn_with_state(state, rate_limit::limit_by_ip))
}

async fn not_found() -> AppError {
    AppError::NotFound
}
