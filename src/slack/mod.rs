use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Slack API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Slack API returned an error: {0}")]
    Api(String),
}

/// Delivers the completion message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), SlackError>;
}

/// Posts messages to one Slack channel through `chat.postMessage`.
pub struct SlackClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    channel: String,
}

impl SlackClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel: channel.into(),
        }
    }
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack answers 200 even on failure; `ok` carries the outcome.
#[derive(Deserialize)]
struct PostMessageResult {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
}

#[async_trait]
impl Notifier for SlackClient {
    #[instrument(skip(self, text), fields(channel = %self.channel))]
    async fn notify(&self, text: &str) -> Result<(), SlackError> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let result = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&PostMessage {
                channel: &self.channel,
                text,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<PostMessageResult>()
            .await?;

        if !result.ok {
            return Err(SlackError::Api(
                result.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        debug!(ts = result.ts.as_deref().unwrap_or_default(), "posted message");
        Ok(())
    }
}
