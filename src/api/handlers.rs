use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::alerts::{AlertDispatcher, AlertError};

/// Application state shared across handlers
pub struct AppState {
    pub dispatcher: AlertDispatcher,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Balance Alert
// ============================================================================

/// Run one alert invocation and render the report page
pub async fn run_alert(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let outcome = state
        .dispatcher
        .run(chrono::Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Balance alert invocation failed");
            ApiError::from(e)
        })?;

    if !outcome.notification_errors.is_empty() {
        tracing::warn!(
            failures = outcome.notification_errors.len(),
            "Report rendered but some notifications were not delivered"
        );
    }

    Ok(Html(outcome.report.render_page()))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Fatal invocation error, rendered as a short plain-text body
#[derive(Debug)]
pub enum ApiError {
    Upstream(String),
    Internal(String),
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::Fetch(e) => ApiError::Upstream(e.to_string()),
            AlertError::MalformedBalance(e) => ApiError::Internal(e.to_string()),
            AlertError::Overflow(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
