//! OpenAI-compatible chat completions judge.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use gradekit_core::traits::{
    build_judge_prompt, parse_verdict, JudgeRequest, JudgeVerdict, SemanticJudge,
    JUDGE_SYSTEM_PROMPT,
};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Semantic judge backed by an OpenAI-compatible chat completions API.
pub struct OpenAiJudge {
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiJudge {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        Self::with_timeout(
            api_key,
            base_url,
            org_id,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a judge whose HTTP requests give up after `timeout`.
    pub fn with_timeout(
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            org_id,
            timeout_secs: timeout.as_secs(),
            client,
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl SemanticJudge for OpenAiJudge {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn judge(&self, request: &JudgeRequest) -> anyhow::Result<JudgeVerdict> {
        if !self.is_available() {
            return Err(ProviderError::MissingApiKey("openai").into());
        }

        let start = Instant::now();

        let body = OpenAiRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: JUDGE_SYSTEM_PROMPT.to_string(),
                },
                OpenAiMessage {
                    role: "user",
                    content: build_judge_prompt(request),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OpenAiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let (score, feedback) =
            parse_verdict(&content).ok_or_else(|| ProviderError::unparseable(&content))?;

        Ok(JudgeVerdict {
            score,
            feedback,
            model: api_response.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> JudgeRequest {
        JudgeRequest {
            model: "gpt-4.1-mini".into(),
            question: "Why do seasons change?".into(),
            model_answer: "Earth's axial tilt changes how directly sunlight hits each hemisphere"
                .into(),
            student_answer: "Because the Earth is tilted".into(),
            marks: 4.0,
            max_tokens: 512,
            temperature: 0.0,
        }
    }

    fn reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content, "role": "assistant"}, "index": 0}],
            "model": "gpt-4.1-mini",
            "usage": {"prompt_tokens": 90, "completion_tokens": 20, "total_tokens": 110}
        })
    }

    #[tokio::test]
    async fn successful_verdict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                r#"{"score": 0.5, "feedback": "Mention how the tilt affects sunlight."}"#,
            )))
            .mount(&server)
            .await;

        let judge = OpenAiJudge::new("test-key", Some(server.uri()), None);
        let verdict = judge.judge(&request()).await.unwrap();
        assert_eq!(verdict.score, 0.5);
        assert!(verdict.feedback.unwrap().contains("tilt"));
        assert_eq!(verdict.model, "gpt-4.1-mini");
    }

    #[tokio::test]
    async fn organization_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("OpenAI-Organization", "org-school"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(r#"{"score": 1}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let judge = OpenAiJudge::new("test-key", Some(server.uri()), Some("org-school".into()));
        assert_eq!(judge.judge(&request()).await.unwrap().score, 1.0);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(r#"{"score": 4}"#)))
            .mount(&server)
            .await;

        let judge = OpenAiJudge::new("test-key", Some(server.uri()), None);
        let err = judge.judge(&request()).await.unwrap_err();
        assert!(err.to_string().contains("unparseable verdict"));
    }

    #[tokio::test]
    async fn server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let judge = OpenAiJudge::new("test-key", Some(server.uri()), None);
        let err = judge.judge(&request()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn model_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let judge = OpenAiJudge::new("test-key", Some(server.uri()), None);
        let err = judge.judge(&request()).await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
