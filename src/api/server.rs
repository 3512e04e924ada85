use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, run_alert, AppState};
use crate::alerts::{build_notifiers, AlertDispatcher, ThresholdPolicy};
use crate::config::AppConfig;
use crate::source::LunchMoneyClient;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Invocation trigger
        .route("/", get(run_alert).post(run_alert))
        // Health check
        .route("/health", get(health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the dispatcher from configuration
pub fn build_state(config: &AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let source = LunchMoneyClient::new(
        config.source.base_url.clone(),
        config.source.api_key.clone(),
        config.source.timeout,
    )?;
    let notifiers = build_notifiers(&config.targets, config.source.timeout)?;

    Ok(AppState {
        dispatcher: AlertDispatcher::new(
            Arc::new(source),
            ThresholdPolicy::new(config.policy.clone()),
            notifiers,
        ),
    })
}

/// Run the HTTP server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(build_state(&config)?);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting balance alert server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Balance alert server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::config::PolicyConfig;
    use crate::alerts::{Notifier, NotifierError};
    use crate::data::PlaidAccount;
    use crate::source::{AccountSource, SourceError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    enum FakeSource {
        Accounts(Vec<PlaidAccount>),
        Down,
    }

    #[async_trait]
    impl AccountSource for FakeSource {
        async fn fetch_accounts(&self) -> Result<Vec<PlaidAccount>, SourceError> {
            match self {
                FakeSource::Accounts(accounts) => Ok(accounts.clone()),
                FakeSource::Down => Err(SourceError::Network("connection refused".to_string())),
            }
        }
    }

    struct RefusingNotifier;

    #[async_trait]
    impl Notifier for RefusingNotifier {
        fn name(&self) -> &str {
            "email"
        }

        async fn send(&self, _subject: &str, _body: &str) -> Result<(), NotifierError> {
            Err(NotifierError::Smtp("Connection refused".to_string()))
        }
    }

    fn plaid(id: i64, name: &str, category: &str, balance: &str) -> PlaidAccount {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "date_linked": "2022-01-01",
            "name": name,
            "display_name": name,
            "type": category,
            "mask": "0000",
            "institution_name": "Bank",
            "status": "active",
            "balance": balance,
            "currency": "usd",
            "balance_last_update": "2024-03-10T11:00:00Z",
            "plaid_last_successful_update": "2024-03-10T11:00:00Z"
        }))
        .unwrap()
    }

    fn create_test_app(source: FakeSource) -> Router {
        let state = Arc::new(AppState {
            dispatcher: AlertDispatcher::new(
                Arc::new(source),
                ThresholdPolicy::new(PolicyConfig::new("Checking")),
                vec![Arc::new(RefusingNotifier)],
            ),
        });
        build_router(state)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(FakeSource::Accounts(vec![]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report_rendered_despite_notifier_failure() {
        let app = create_test_app(FakeSource::Accounts(vec![
            plaid(1, "Visa", "credit", "1000.00"),
            plaid(2, "Checking", "depository", "3000.00"),
        ]));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let body = body_text(response).await;
        assert!(body.starts_with("<html><body>"));
        assert!(body.contains("ALERT: Total deposits is low"));
        assert!(body.contains("Checking with balance $3,000.00"));
        assert!(body.trim_end().ends_with("</body></html>"));
    }

    #[tokio::test]
    async fn test_post_trigger() {
        let app = create_test_app(FakeSource::Accounts(vec![plaid(
            1,
            "Checking",
            "depository",
            "500.00",
        )]));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(!body.contains("ALERT"));
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_no_listing() {
        let app = create_test_app(FakeSource::Down);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
        let body = body_text(response).await;
        assert!(body.contains("connection refused"));
        assert!(!body.contains("Accounts"));
    }

    #[tokio::test]
    async fn test_malformed_balance_returns_no_listing() {
        let app = create_test_app(FakeSource::Accounts(vec![
            plaid(1, "Visa", "credit", "1000.00"),
            plaid(2, "Checking", "depository", "N/A"),
        ]));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("Malformed balance"));
        assert!(!body.contains("Visa with balance"));
    }

    #[tokio::test]
    async fn test_overflowing_balance_returns_error() {
        let app = create_test_app(FakeSource::Accounts(vec![plaid(
            1,
            "Visa",
            "credit",
            "30000000000000000000000000000",
        )]));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("overflowed"));
        assert!(!body.contains("<html>"));
    }
}
