// English / Myanmar translation for the translate chat page.
//
// Failures never surface as errors: the caller gets the failure text in
// place of a translation, plus the raw response for the debug panel.

use homeroom_core::config::Config;
use tracing::warn;

use crate::client::{LlmClient, LlmError, RequestOptions};

/// Translation target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    English,
    Myanmar,
}

impl Target {
    fn instruction(self) -> &'static str {
        match self {
            Target::English => "Translate this to English:",
            Target::Myanmar => "Translate this to Myanmar (Burmese) language:",
        }
    }
}

pub fn translation_prompt(target: Target, text: &str) -> String {
    format!(
        "{}\n\n{}\n\nOnly provide the translation, no explanations.",
        target.instruction(),
        text
    )
}

/// Raw details of a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationDebug {
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl TranslationDebug {
    pub fn render(&self) -> String {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "HTTP status: {}\n{}",
            status,
            self.body.as_deref().unwrap_or("<no response body>")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// The translated text, or a `Translation error: ...` message.
    pub text: String,
    pub debug: Option<TranslationDebug>,
}

impl Translation {
    pub fn is_error(&self) -> bool {
        self.debug.is_some()
    }
}

/// Translator bound to the `[translate]` endpoint.
pub struct Translator {
    client: LlmClient,
    options: RequestOptions,
}

impl Translator {
    pub fn new(client: LlmClient, max_tokens: u32, temperature: f32) -> Self {
        Translator {
            client,
            options: RequestOptions {
                title: None,
                max_tokens,
                temperature,
            },
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Translator::new(
            LlmClient::for_translation(config),
            config.translate.max_tokens,
            config.translate.temperature,
        )
    }

    pub async fn translate(&self, target: Target, text: &str) -> Translation {
        let prompt = translation_prompt(target, text);
        match self.client.complete(&self.options, &prompt).await {
            Ok(text) => Translation { text, debug: None },
            Err(e) => {
                warn!(?target, "translation failed: {e}");
                error_translation(e)
            }
        }
    }

    /// English first, then Myanmar.
    pub async fn translate_both(&self, text: &str) -> (Translation, Translation) {
        let english = self.translate(Target::English, text).await;
        let myanmar = self.translate(Target::Myanmar, text).await;
        (english, myanmar)
    }
}

fn error_translation(err: LlmError) -> Translation {
    let (message, debug) = match err {
        LlmError::NotConfigured => (
            "API key not configured".to_string(),
            TranslationDebug {
                status: None,
                body: None,
            },
        ),
        LlmError::Status { status, body } => {
            let message = match status {
                401 => "Invalid API key".to_string(),
                402 => "Insufficient credits".to_string(),
                429 => "Rate limit exceeded".to_string(),
                _ => format!("HTTP {status} - {}", snippet(&body)),
            };
            (
                message,
                TranslationDebug {
                    status: Some(status),
                    body: Some(body),
                },
            )
        }
        LlmError::InvalidResponse { detail, body } => (
            format!("invalid response format ({detail})"),
            TranslationDebug {
                status: Some(200),
                body: Some(body),
            },
        ),
        LlmError::Transport(e) => (
            e.to_string().chars().take(100).collect(),
            TranslationDebug {
                status: None,
                body: None,
            },
        ),
    };
    Translation {
        text: format!("Translation error: {message}"),
        debug: Some(debug),
    }
}

/// First 400 characters of a response body on one line.
fn snippet(body: &str) -> String {
    body.chars()
        .take(400)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
