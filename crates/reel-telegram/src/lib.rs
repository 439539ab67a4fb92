//! Telegram Bot API adapter.
//!
//! Implements the `reel-core` history and file-lookup ports over plain HTTPS
//! calls to the Bot API (`getChatHistory`, `getFile`).

use async_trait::async_trait;
use serde_json::Value;

use reel_core::{
    config::{Config, Credentials},
    domain::{MediaRef, RawMessage},
    errors::Error,
    ports::{ChannelHistory, FileLocator},
    utils::{redact, truncate_text},
    Result,
};

const MAX_DETAIL_LEN: usize = 300;

#[derive(Clone, Debug)]
pub struct TelegramBotApi {
    http: reqwest::Client,
    api_url: String,
    creds: Credentials,
}

impl TelegramBotApi {
    /// Build a client for one request cycle. No timeout below the transport
    /// default is applied.
    pub fn new(api_url: impl Into<String>, creds: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            creds,
        })
    }

    pub fn from_config(cfg: &Config, creds: Credentials) -> Result<Self> {
        Self::new(cfg.telegram_api_url.clone(), creds)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.creds.bot_token)
    }

    fn scrub(&self, text: &str) -> String {
        truncate_text(&redact(text, &self.creds.bot_token), MAX_DETAIL_LEN)
    }

    /// Issue a Bot API GET and classify the reply.
    ///
    /// Transport failures and non-success statuses land in `Err(Call::Unavailable)`;
    /// a success status with an undecodable or `ok: false` body lands in
    /// `Err(Call::Protocol)`. On success the `result` object is returned.
    async fn call(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<Value, Call> {
        let resp = self
            .http
            .get(self.method_url(method))
            .query(query)
            .send()
            .await
            .map_err(|e| Call::Unavailable(self.scrub(&format!("{method} request error: {e}"))))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Call::Unavailable(self.scrub(&format!("{method} body error: {e}"))))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| description(&v))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .map(str::to_string)
                        .unwrap_or_else(|| status.to_string())
                });
            let detail = self.scrub(&detail);
            tracing::warn!(
                method,
                status = status.as_u16(),
                detail = %detail,
                "bot api call failed"
            );
            return Err(Call::Unavailable(detail));
        }

        let v: Value = serde_json::from_str(&body)
            .map_err(|e| Call::Protocol(format!("{method} returned invalid json: {e}")))?;

        if v.get("ok").and_then(Value::as_bool) != Some(true) {
            let detail =
                description(&v).unwrap_or_else(|| "ok flag missing or false".to_string());
            return Err(Call::Protocol(self.scrub(&format!("{method}: {detail}"))));
        }

        match v.get("result") {
            Some(result) if !result.is_null() => Ok(result.clone()),
            _ => Err(Call::Protocol(format!("{method}: result missing"))),
        }
    }
}

/// Internal classification of a failed Bot API call.
enum Call {
    Unavailable(String),
    Protocol(String),
}

impl Call {
    fn into_message(self) -> String {
        match self {
            Call::Unavailable(s) | Call::Protocol(s) => s,
        }
    }
}

fn description(v: &Value) -> Option<String> {
    v.get("description")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ChannelHistory for TelegramBotApi {
    async fn recent_messages(&self, limit: u32) -> Result<Vec<RawMessage>> {
        tracing::info!(channel = %self.creds.channel_id, limit, "fetching channel history");

        let limit = limit.to_string();
        let result = self
            .call(
                "getChatHistory",
                &[("chat_id", self.creds.channel_id.as_str()), ("limit", limit.as_str())],
            )
            .await
            .map_err(|e| match e {
                Call::Unavailable(s) => Error::UpstreamUnavailable(s),
                Call::Protocol(s) => Error::UpstreamProtocol(s),
            })?;

        let Some(messages) = result.get("messages").and_then(Value::as_array) else {
            return Err(Error::UpstreamProtocol(
                "getChatHistory: result.messages missing".to_string(),
            ));
        };

        Ok(messages.iter().cloned().map(RawMessage::from_value).collect())
    }
}

#[async_trait]
impl FileLocator for TelegramBotApi {
    async fn file_path(&self, media_ref: &MediaRef) -> Result<String> {
        let item_err = |reason: String| Error::ItemResolution {
            media_ref: media_ref.to_string(),
            reason,
        };

        let result = self
            .call("getFile", &[("file_id", media_ref.0.as_str())])
            .await
            .map_err(|e| item_err(e.into_message()))?;

        result
            .get("file_path")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| item_err("getFile: file_path missing".to_string()))
    }

    fn download_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_url,
            self.creds.bot_token,
            file_path.trim_start_matches('/')
        )
    }
}
