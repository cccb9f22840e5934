// Chat-completion client for OpenAI-compatible endpoints (OpenRouter, DeepSeek).
//
// `complete` performs a single request and returns the reply text.
// `stream_message` sends the same request with `stream: true`, parses the
// Server-Sent Events into `LlmEvent` variants and forwards them over an mpsc
// channel for the app orchestrator to consume.

use std::time::Duration;

use futures_util::StreamExt;
use homeroom_core::config::Config;
use homeroom_core::protocol::LlmEvent;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors and request options
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx reply whose body is not a chat completion. `body` is kept raw
    /// for the debug panel.
    #[error("invalid response format ({detail})")]
    InvalidResponse { detail: String, body: String },
}

/// Per-request tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Sent as `X-Title` when present.
    pub title: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Connection settings for one endpoint.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Sent as `HTTP-Referer` when present.
    pub referer: Option<String>,
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Low-level chat-completion client bound to one endpoint and model.
pub struct ChatClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl ChatClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn request(&self, opts: &RequestOptions, prompt: &str, stream: bool) -> reqwest::RequestBuilder {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        });
        if stream {
            body["stream"] = Value::Bool(true);
        }

        let mut request = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .header("content-type", "application/json")
            .timeout(self.settings.timeout)
            .json(&body);
        if let Some(referer) = &self.settings.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &opts.title {
            request = request.header("X-Title", title);
        }
        request
    }

    /// Send one request and return the trimmed reply text.
    pub async fn complete(&self, opts: &RequestOptions, prompt: &str) -> Result<String, LlmError> {
        if self.settings.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let response = self.request(opts, prompt, false).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "chat completion response");

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_completion(&body)
    }

    /// Send a streaming request and forward the reply as `LlmEvent`s over
    /// `tx`. Every event carries `generation`.
    ///
    /// Returns when the stream is complete, an error occurs, or the receiver
    /// is dropped.
    pub async fn stream_message(
        &self,
        opts: &RequestOptions,
        prompt: &str,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        if self.settings.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: LlmError::NotConfigured.to_string(),
                    generation,
                })
                .await;
            return Ok(());
        }

        let mut es = match self.request(opts, prompt, true).eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                        generation,
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();
        let mut stop_reason: Option<String> = None;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let data = msg.data.trim();
                    if data == "[DONE]" {
                        debug!("[DONE] - streaming complete");
                        es.close();
                        let _ = tx
                            .send(LlmEvent::Complete {
                                full_text,
                                stop_reason,
                                generation,
                            })
                            .await;
                        return Ok(());
                    }
                    if let Some(reason) = parse_finish_reason(data) {
                        stop_reason = Some(reason);
                    }
                    if let Some(text) = parse_delta_content(data) {
                        if text.is_empty() {
                            continue;
                        }
                        full_text.push_str(&text);
                        if tx.send(LlmEvent::Token { text, generation }).await.is_err() {
                            // Receiver dropped - abort stream.
                            es.close();
                            return Ok(());
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("SSE stream ended without [DONE]");
                    break;
                }
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let _ = tx
                        .send(LlmEvent::Error {
                            message: extract_error_message(&err),
                            generation,
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
            }
        }
        es.close();

        let event = if full_text.is_empty() {
            LlmEvent::Error {
                message: "Stream ended unexpectedly without any content".to_string(),
                generation,
            }
        } else {
            LlmEvent::Complete {
                full_text,
                stop_reason,
                generation,
            }
        };
        let _ = tx.send(event).await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// Either a configured client or a placeholder that fails every request.
pub enum LlmClient {
    Active(ChatClient),
    /// No API key configured.
    Disabled,
}

impl LlmClient {
    /// Client for question generation and news analysis (`[llm]` section).
    pub fn for_questions(config: &Config) -> Self {
        match config.credentials.question_llm_key() {
            Some(key) => LlmClient::Active(ChatClient::new(ClientSettings {
                base_url: config.llm.base_url.clone(),
                api_key: key.to_string(),
                model: config.llm.model.clone(),
                referer: Some(config.llm.referer.clone()).filter(|r| !r.is_empty()),
                timeout: Duration::from_secs(config.llm.timeout_secs),
            })),
            None => LlmClient::Disabled,
        }
    }

    /// Client for the translate chat (`[translate]` section).
    pub fn for_translation(config: &Config) -> Self {
        match config.credentials.translator_key() {
            Some(key) => LlmClient::Active(ChatClient::new(ClientSettings {
                base_url: config.translate.base_url.clone(),
                api_key: key.to_string(),
                model: config.translate.model.clone(),
                referer: None,
                timeout: Duration::from_secs(config.translate.timeout_secs),
            })),
            None => LlmClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    pub async fn complete(&self, opts: &RequestOptions, prompt: &str) -> Result<String, LlmError> {
        match self {
            LlmClient::Active(client) => client.complete(opts, prompt).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }

    /// Stream a message, delegating to the inner `ChatClient` or immediately
    /// sending an error if disabled.
    pub async fn stream_message(
        &self,
        opts: &RequestOptions,
        prompt: &str,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => client.stream_message(opts, prompt, tx, generation).await,
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: "LLM not configured".to_string(),
                        generation,
                    })
                    .await;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `choices[0].message.content` from a non-streaming response body.
pub(crate) fn parse_completion(body: &str) -> Result<String, LlmError> {
    let invalid = |detail: String| LlmError::InvalidResponse {
        detail,
        body: body.to_string(),
    };
    let v: Value = serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| invalid("missing choices[0].message.content".into()))
}

/// Extract `choices[0].delta.content` from a streaming chunk.
pub(crate) fn parse_delta_content(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `choices[0].finish_reason` from a streaming chunk, if set.
pub(crate) fn parse_finish_reason(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("choices")?
        .get(0)?
        .get("finish_reason")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract a human-readable error message from an SSE error.
fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("API returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => {
            format!("Network error: {e}")
        }
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
