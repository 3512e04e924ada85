//! Notification channels for alerts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::config::{NotifyTarget, SmtpSettings};

/// A delivery channel for alert messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs
    fn name(&self) -> &str;

    /// Deliver one message
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifierError>;
}

/// Build one notifier per configured target; `timeout` bounds each webhook request
pub fn build_notifiers(
    targets: &[NotifyTarget],
    timeout: Duration,
) -> Result<Vec<Arc<dyn Notifier>>, NotifierError> {
    targets
        .iter()
        .map(|target| -> Result<Arc<dyn Notifier>, NotifierError> {
            Ok(match target {
                NotifyTarget::Log => Arc::new(LogNotifier),
                NotifyTarget::Webhook { url, headers } => {
                    Arc::new(WebhookNotifier::new(url.clone(), headers.clone(), timeout)?)
                }
                NotifyTarget::Email(settings) => Arc::new(SmtpNotifier::new(settings)?),
            })
        })
        .collect()
}

/// Writes alerts to the tracing log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifierError> {
        tracing::warn!(subject = %subject, "Alert triggered: {}", body);
        Ok(())
    }
}

/// Posts alerts as JSON to an HTTP endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    headers: HashMap<String, String>,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        headers: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Webhook(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            headers,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifierError> {
        let payload = serde_json::json!({
            "subject": subject,
            "message": body,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut request = self.client.post(&self.url).json(&payload);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(url = %self.url, "Webhook notification sent");

        Ok(())
    }
}

/// Sends alerts as HTML email over authenticated SMTP with implicit TLS
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: lettre::message::Mailbox,
    to: lettre::message::Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifierError> {
        let from = settings
            .from
            .parse()
            .map_err(|e| NotifierError::Address(format!("{}: {}", settings.from, e)))?;
        let to = settings
            .to
            .parse()
            .map_err(|e| NotifierError::Address(format!("{}: {}", settings.to, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)
            .map_err(|e| NotifierError::Smtp(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.pass.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifierError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| NotifierError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifierError::Smtp(e.to_string()))?;

        tracing::debug!(to = %self.to, "Email notification sent");

        Ok(())
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Invalid email address: {0}")]
    Address(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    async fn spawn_hook(status: StatusCode) -> (String, mpsc::Receiver<serde_json::Value>) {
        let (tx, rx) = mpsc::channel(4);
        let app = Router::new().route(
            "/hook",
            post(move |Json(payload): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(payload).await;
                    status
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/hook", addr), rx)
    }

    #[tokio::test]
    async fn test_log_notification() {
        let result = LogNotifier.send("subject", "test message").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_delivers_payload() {
        let (url, mut rx) = spawn_hook(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(url, HashMap::new(), Duration::from_secs(5)).unwrap();

        notifier.send("Low balance", "<p>body</p>").await.unwrap();

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload["subject"], "Low balance");
        assert_eq!(payload["message"], "<p>body</p>");
    }

    #[tokio::test]
    async fn test_webhook_error_status() {
        let (url, _rx) = spawn_hook(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(url, HashMap::new(), Duration::from_secs(5)).unwrap();

        let err = notifier.send("s", "b").await.unwrap_err();
        assert!(matches!(err, NotifierError::Webhook(_)));
    }

    #[tokio::test]
    async fn test_webhook_timeout() {
        let app = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let notifier = WebhookNotifier::new(
            format!("http://{}/hook", addr),
            HashMap::new(),
            Duration::from_millis(100),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = notifier.send("s", "b").await.unwrap_err();
        assert!(matches!(err, NotifierError::Webhook(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_smtp_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let notifier = SmtpNotifier::new(&SmtpSettings {
            server: "127.0.0.1".to_string(),
            port,
            user: "user".to_string(),
            pass: "pass".to_string(),
            from: "alerts@example.com".to_string(),
            to: "me@example.com".to_string(),
        })
        .unwrap();

        let err = notifier.send("s", "b").await.unwrap_err();
        assert!(matches!(err, NotifierError::Smtp(_)));
    }

    #[test]
    fn test_invalid_address() {
        let result = SmtpNotifier::new(&SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 465,
            user: "user".to_string(),
            pass: "pass".to_string(),
            from: "not an address".to_string(),
            to: "me@example.com".to_string(),
        });
        assert!(matches!(result, Err(NotifierError::Address(_))));
    }

    #[test]
    fn test_build_notifiers() {
        let targets = [
            NotifyTarget::Log,
            NotifyTarget::Webhook {
                url: "http://localhost/hook".to_string(),
                headers: HashMap::new(),
            },
        ];
        let notifiers = build_notifiers(&targets, Duration::from_secs(5)).unwrap();
        let names: Vec<&str> = notifiers.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["log", "webhook"]);
    }
}
