use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Health response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMap {
    pub health: String,
    pub send_email: String,
}

/// Service descriptor returned from `/`
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub success: bool,
    pub message: String,
    pub version: String,
    pub timestamp: String,
    pub endpoints: EndpointMap,
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: format!("{} Email Service is running", state.config.company_name),
        timestamp: timestamp(),
        version: VERSION.to_string(),
    })
}

/// GET / - Service descriptor
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        success: true,
        message: format!("{} Email Service API", state.config.company_name),
        version: VERSION.to_string(),
        timestamp: timestamp(),
        endpoints: EndpointMap {
            health: "/api/health".to_string(),
            send_email: "/api/send-email (POST)".to_string(),
        },
    })
}
