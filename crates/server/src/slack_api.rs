//! Outbound Slack Web API calls.
//!
//! The service layer talks to Slack through the [`SlackApi`] trait: opening
//! modals with a `trigger_id`, replying through a command/action
//! `response_url`, and posting ephemeral messages into a channel. The
//! reqwest implementation is the only networked piece; tests swap in
//! [`RecordingSlackApi`].

use async_trait::async_trait;
use projector_core::errors::ApplicationError;
use projector_slack::blocks::MessageTemplate;
use projector_slack::modals::ModalView;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

const SLACK_API_BASE: &str = "https://slack.com/api";

#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `views.open` with the interaction's trigger id.
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApplicationError>;

    /// Posts to a slash-command or block-action `response_url`. With
    /// `replace_original` the message that hosted the clicked control is
    /// swapped in place, which is how page turns work.
    async fn post_response(
        &self,
        response_url: &str,
        message: &MessageTemplate,
        replace_original: bool,
    ) -> Result<(), ApplicationError>;

    /// `chat.postEphemeral`, visible only to `user_id` in `channel_id`.
    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApplicationError>;
}

pub struct HttpSlackApi {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpSlackApi {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(SLACK_API_BASE.to_owned(), bot_token)
    }

    pub fn with_base_url(base_url: String, bot_token: SecretString) -> Self {
        Self { client: reqwest::Client::new(), base_url, bot_token }
    }

    async fn call_web_api(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<(), ApplicationError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| ApplicationError::SlackApi(error.to_string()))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|error| ApplicationError::SlackApi(error.to_string()))?;

        if payload["ok"].as_bool() != Some(true) {
            let reason = payload["error"].as_str().unwrap_or("unknown_error");
            return Err(ApplicationError::SlackApi(format!("{method} failed: {reason}")));
        }
        debug!(method, "slack web api call succeeded");
        Ok(())
    }
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApplicationError> {
        self.call_web_api("views.open", json!({ "trigger_id": trigger_id, "view": view })).await
    }

    async fn post_response(
        &self,
        response_url: &str,
        message: &MessageTemplate,
        replace_original: bool,
    ) -> Result<(), ApplicationError> {
        let response = self
            .client
            .post(response_url)
            .json(&json!({
                "response_type": "ephemeral",
                "replace_original": replace_original,
                "text": &message.fallback_text,
                "blocks": &message.blocks,
            }))
            .send()
            .await
            .map_err(|error| ApplicationError::SlackApi(error.to_string()))?;

        if !response.status().is_success() {
            return Err(ApplicationError::SlackApi(format!(
                "response_url post failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApplicationError> {
        self.call_web_api(
            "chat.postEphemeral",
            json!({
                "channel": channel_id,
                "user": user_id,
                "text": &message.fallback_text,
                "blocks": &message.blocks,
            }),
        )
        .await
    }
}

/// Records every outbound call for assertions. Lives outside `cfg(test)` the
/// same way the in-memory repositories do, so route tests can use it too.
#[derive(Default)]
pub struct RecordingSlackApi {
    calls: tokio::sync::Mutex<Vec<SlackCall>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlackCall {
    OpenView { trigger_id: String, view: ModalView },
    PostResponse { response_url: String, message: MessageTemplate, replace_original: bool },
    PostEphemeral { channel_id: String, user_id: String, message: MessageTemplate },
}

impl RecordingSlackApi {
    pub async fn calls(&self) -> Vec<SlackCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl SlackApi for RecordingSlackApi {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ApplicationError> {
        self.calls.lock().await.push(SlackCall::OpenView {
            trigger_id: trigger_id.to_owned(),
            view: view.clone(),
        });
        Ok(())
    }

    async fn post_response(
        &self,
        response_url: &str,
        message: &MessageTemplate,
        replace_original: bool,
    ) -> Result<(), ApplicationError> {
        self.calls.lock().await.push(SlackCall::PostResponse {
            response_url: response_url.to_owned(),
            message: message.clone(),
            replace_original,
        });
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), ApplicationError> {
        self.calls.lock().await.push(SlackCall::PostEphemeral {
            channel_id: channel_id.to_owned(),
            user_id: user_id.to_owned(),
            message: message.clone(),
        });
        Ok(())
    }
}
