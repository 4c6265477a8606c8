use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::SlackConfig,
    format::Formatter,
    model::Paper
};

const SLACK_POST_MESSAGE: &str = "https://slack.com/api/chat.postMessage";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, paper: &Paper) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rejected with status {status}: {reason}")]
    Rejected { status: StatusCode, reason: String },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub notified: usize,
    pub failed: usize,
}

/// Sends every paper, logging failures without stopping.
pub async fn notify_all<N>(notifier: &N, papers: &[Paper]) -> Delivery
where
    N: Notifier + ?Sized,
{
    let mut delivery = Delivery::default();
    for paper in papers {
        match notifier.notify(paper).await {
            Ok(()) => delivery.notified += 1,
            Err(e) => {
                warn!(title = %paper.title, error = %e, "failed to send notification");
                delivery.failed += 1;
            }
        }
    }
    delivery
}

pub struct SlackNotifier {
    config: SlackConfig,
    client: Client
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: String,
    unfurl_links: bool
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        SlackNotifier {
            config,
            client: Client::new()
        }
    }

    fn payload(&self, paper: &Paper) -> PostMessage<'_> {
        PostMessage {
            channel: &self.config.channel,
            text: Formatter::to_slack_message(paper),
            unfurl_links: false
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, paper: &Paper) -> Result<(), NotifyError> {
        let response = self.client
            .post(SLACK_POST_MESSAGE)
            .bearer_auth(&self.config.token)
            .json(&self.payload(paper))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, reason });
        }

        // slack reports most failures as 200 with `ok: false`.
        let body: PostMessageResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Rejected {
                status,
                reason: body.error.unwrap_or_else(|| "unknown error".to_string())
            });
        }
        Ok(())
    }
}

/// Used when no channel is configured: matches only go to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, paper: &Paper) -> Result<(), NotifyError> {
        info!("matched: {}", Formatter::to_log_line(paper));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FlakyNotifier {
        fail_title: &'static str,
        sent: Mutex<Vec<String>>
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn notify(&self, paper: &Paper) -> Result<(), NotifyError> {
            if paper.title == self.fail_title {
                return Err(NotifyError::Rejected {
                    status: StatusCode::OK,
                    reason: "channel_not_found".to_string()
                });
            }
            self.sent.lock().unwrap().push(paper.title.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_delivery() {
        let notifier = FlakyNotifier { fail_title: "B", sent: Mutex::new(Vec::new()) };
        let papers = vec![
            Paper::new("A", "a", "http://arxiv.org/abs/a"),
            Paper::new("B", "b", "http://arxiv.org/abs/b"),
            Paper::new("C", "c", "http://arxiv.org/abs/c"),
        ];
        let delivery = notify_all(&notifier, &papers).await;

        assert_eq!(delivery, Delivery { notified: 2, failed: 1 });
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let papers = vec![Paper::new("A", "a", "http://arxiv.org/abs/a")];
        assert_eq!(notify_all(&LogNotifier, &papers).await, Delivery { notified: 1, failed: 0 });
    }

    #[test]
    fn test_slack_payload() {
        let notifier = SlackNotifier::new(SlackConfig {
            token: "xoxb-1".to_string(),
            channel: "C123".to_string()
        });
        let paper = Paper::new("Robot Hands", "Grasping.", "http://arxiv.org/abs/1");
        let payload = serde_json::to_value(notifier.payload(&paper)).unwrap();
        assert_eq!(payload, serde_json::json!({
            "channel": "C123",
            "text": "*Robot Hands*\nGrasping.\n<http://arxiv.org/abs/1|http://arxiv.org/abs/1>",
            "unfurl_links": false
        }));
    }

    #[test]
    fn test_slack_error_body() {
        let body: PostMessageResponse = serde_json::from_str(r#"{"ok": false, "error": "not_in_channel"}"#).unwrap();
        assert!(!body.ok);
        assert_eq!(body.error.as_deref(), Some("not_in_channel"));

        let body: PostMessageResponse = serde_json::from_str(r#"{"ok": true, "ts": "1.2"}"#).unwrap();
        assert!(body.ok);
    }
}
