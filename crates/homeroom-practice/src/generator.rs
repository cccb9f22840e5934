// Question generation: ask the LLM, fall back to the built-in bank.

use homeroom_core::config::QuestionStyle;
use homeroom_core::Level;
use homeroom_llm::client::LlmClient;
use tracing::{info, warn};

use crate::fallback::fallback_questions;
use crate::parse::parse_math_response;
use crate::prompt::{build_math_prompt, question_request_options};
use crate::question::{Origin, QuestionBatch};

/// Produce a batch of at most `count` questions for `level`. Never returns
/// an empty batch: any failure yields the fallback bank for the same level.
pub async fn generate_questions(
    client: &LlmClient,
    level: Level,
    count: usize,
    style: QuestionStyle,
    fast: bool,
) -> QuestionBatch {
    let count = count.max(1);
    let prompt = build_math_prompt(level, count, style);
    let opts = question_request_options(count, fast);

    let reason = match client.complete(&opts, &prompt).await {
        Ok(reply) => {
            let mut questions = parse_math_response(&reply);
            if !questions.is_empty() {
                questions.truncate(count);
                info!(%level, n = questions.len(), "generated questions");
                return QuestionBatch {
                    questions,
                    origin: Origin::Llm,
                };
            }
            "the reply contained no usable questions".to_string()
        }
        Err(e) => e.to_string(),
    };

    warn!(%level, "using fallback questions: {reason}");
    QuestionBatch {
        questions: fallback_questions(level, count),
        origin: Origin::Fallback { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeroom_llm::client::{ChatClient, ClientSettings};
    use homeroom_llm::test_support::{request_body, serve_once, MockResponse};
    use std::time::Duration;

    fn client_for(addr: std::net::SocketAddr) -> LlmClient {
        LlmClient::Active(ChatClient::new(ClientSettings {
            base_url: format!("http://{addr}"),
            api_key: "sk-or".to_string(),
            model: "m".to_string(),
            referer: None,
            timeout: Duration::from_secs(5),
        }))
    }

    #[tokio::test]
    async fn uses_llm_questions_when_parsable() {
        let reply = MockResponse::completion("Q: 2 + 2 = ?\nA: 4\nQ: 3 × 3 = ?\nA: 9\nQ: 1 + 0 = ?\nA: 1");
        let (addr, server) = serve_once(&reply.status, &reply.content_type, &reply.body).await;

        let batch =
            generate_questions(&client_for(addr), Level::P1, 2, QuestionStyle::Balanced, true).await;
        assert_eq!(batch.origin, Origin::Llm);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.questions[1].text, "3 × 3 = ?");

        let request = server.await.unwrap();
        let sent: serde_json::Value = serde_json::from_str(request_body(&request)).unwrap();
        assert_eq!(sent["max_tokens"], 300);
        assert!(sent["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Primary 1 (Ages 6-7)"));
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_to_requested_level() {
        let reply = MockResponse::completion("I cannot help with that.");
        let (addr, _server) = serve_once(&reply.status, &reply.content_type, &reply.body).await;

        let batch =
            generate_questions(&client_for(addr), Level::P5, 10, QuestionStyle::Balanced, true).await;
        assert!(batch.fallback_reason().is_some());
        assert_eq!(batch.questions, fallback_questions(Level::P5, 10));
    }

    #[tokio::test]
    async fn http_error_falls_back() {
        let (addr, _server) = serve_once("500 Internal Server Error", "text/plain", "oops").await;
        let batch =
            generate_questions(&client_for(addr), Level::P4, 5, QuestionStyle::MentalMath, false).await;
        assert_eq!(batch.fallback_reason(), Some("HTTP 500"));
        assert_eq!(batch.len(), 5);
    }

    #[tokio::test]
    async fn disabled_client_falls_back() {
        let batch =
            generate_questions(&LlmClient::Disabled, Level::Plse, 10, QuestionStyle::Balanced, true)
                .await;
        assert_eq!(batch.fallback_reason(), Some("API key not configured"));
        assert_eq!(batch.questions[0].text, "Solve: 2x + 5 = 17, x = ?");
    }

    #[tokio::test]
    async fn zero_count_still_returns_a_question() {
        let batch =
            generate_questions(&LlmClient::Disabled, Level::P2, 0, QuestionStyle::Balanced, true).await;
        assert_eq!(batch.len(), 1);
    }
}
