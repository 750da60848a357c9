use crate::config::Config;
use crate::error::NotifyError;
use crate::types::{Notification, PushReceipt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, Instrument};

/// Something that can deliver a push notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<PushReceipt, NotifyError>;
}

// ─── Pushover ────────────────────────────────────────────────────────────────

pub struct PushoverClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    user: String,
}

#[derive(Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
}

#[derive(Deserialize)]
struct PushoverResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    request: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

impl PushoverClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
            user: user.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        Self::new(
            config.pushover_url.clone(),
            config.pushover_token.clone(),
            config.pushover_user.clone(),
            config.notify_timeout(),
        )
    }
}

#[async_trait]
impl Notifier for PushoverClient {
    async fn send(&self, notification: &Notification) -> Result<PushReceipt, NotifyError> {
        let form = PushoverMessage {
            token: &self.token,
            user: &self.user,
            message: &notification.message,
            title: &notification.title,
        };
        let resp = self.client.post(&self.api_url).form(&form).send().await?;

        let status = resp.status();
        // Pushover answers JSON on both success and failure; tolerate anything else.
        let body: PushoverResponse = resp.json().await.unwrap_or(PushoverResponse {
            status: 0,
            request: None,
            errors: Vec::new(),
        });

        if !status.is_success() || body.status != 1 {
            let errors = if body.errors.is_empty() {
                vec![format!("unexpected response status {}", body.status)]
            } else {
                body.errors
            };
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                errors,
                request_id: body.request,
            });
        }

        Ok(PushReceipt {
            request_id: body.request.unwrap_or_default(),
        })
    }
}

// ─── Fire-and-forget dispatch ────────────────────────────────────────────────

/// Spawns one task per notification. Callers never wait on the outcome; a
/// failed send is logged and dropped.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            tracker: TaskTracker::new(),
        }
    }

    /// The handle is only for tests and shutdown; the request path drops it.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        self.tracker.spawn(
            async move {
                match notifier.send(&notification).await {
                    Ok(receipt) => {
                        info!(request_id = %receipt.request_id, "sent notification");
                    }
                    Err(NotifyError::Rejected {
                        status,
                        errors,
                        request_id,
                    }) => {
                        error!(
                            status,
                            request_id = request_id.as_deref().unwrap_or(""),
                            errors = ?errors,
                            "push API rejected notification"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "failed to send notification");
                    }
                }
            }
            .in_current_span(),
        )
    }

    /// Wait up to `grace` for tracked sends to finish. Returns `false` if some
    /// were still running when the grace period ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if !drained {
            error!(
                pending = self.tracker.len(),
                "abandoning in-flight notifications"
            );
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample() -> Notification {
        Notification {
            message: "Alice added a Visa card.".into(),
            title: "customer.source.created".into(),
        }
    }

    async fn client_for(server: &MockServer) -> PushoverClient {
        PushoverClient::new(
            format!("{}/1/messages.json", server.uri()),
            "app-token",
            "user-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pushover_posts_form_and_returns_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("token=app-token"))
            .and(body_string_contains("user=user-key"))
            .and(body_string_contains("message=Alice+added+a+Visa+card."))
            .and(body_string_contains("title=customer.source.created"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "request": "req-123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client_for(&server).await.send(&sample()).await.unwrap();
        assert_eq!(receipt.request_id, "req-123");
    }

    #[tokio::test]
    async fn pushover_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "user": "invalid",
                "errors": ["user identifier is invalid"],
                "status": 0,
                "request": "req-456"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.send(&sample()).await.unwrap_err();
        match err {
            NotifyError::Rejected {
                status,
                errors,
                request_id,
            } => {
                assert_eq!(status, 400);
                assert_eq!(errors, vec!["user identifier is invalid".to_string()]);
                assert_eq!(request_id.as_deref(), Some("req-456"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pushover_treats_non_json_as_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.send(&sample()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 502, .. }));
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _: &Notification) -> Result<PushReceipt, NotifyError> {
            Err(NotifyError::Rejected {
                status: 500,
                errors: vec!["down".into()],
                request_id: None,
            })
        }
    }

    #[tokio::test]
    async fn failed_dispatch_does_not_panic() {
        let dispatcher = Dispatcher::new(Arc::new(FailingNotifier));
        dispatcher.dispatch(sample()).await.unwrap();
    }

    #[derive(Default)]
    struct CountingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, n: &Notification) -> Result<PushReceipt, NotifyError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.sent.lock().unwrap().push(n.clone());
            Ok(PushReceipt {
                request_id: "ok".into(),
            })
        }
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_sends() {
        let notifier = Arc::new(CountingNotifier::default());
        let dispatcher = Dispatcher::new(notifier.clone());
        drop(dispatcher.dispatch(sample()));
        drop(dispatcher.dispatch(sample()));

        assert!(dispatcher.shutdown(Duration::from_secs(5)).await);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    struct StalledNotifier;

    #[async_trait]
    impl Notifier for StalledNotifier {
        async fn send(&self, _: &Notification) -> Result<PushReceipt, NotifyError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_reports_sends_outliving_grace() {
        let dispatcher = Dispatcher::new(Arc::new(StalledNotifier));
        let handle = dispatcher.dispatch(sample());

        assert!(!dispatcher.shutdown(Duration::from_millis(50)).await);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
