//! OpenAI-compatible chat-completions client (OpenRouter by default).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use plancheck_shared::{PlanCheckError, ReasoningConfig, ReasoningError};

use crate::response::{parse_json_payload, snippet};
use crate::{Reasoner, ReasoningRequest};

/// User-Agent string for reasoning requests.
const USER_AGENT: &str = concat!("PlanCheck/", env!("CARGO_PKG_VERSION"));

/// HTTP reasoning backend speaking the `/chat/completions` protocol.
pub struct OpenRouterReasoner {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenRouterReasoner {
    /// Build a client from the `[reasoning]` config section and a resolved API key.
    pub fn new(
        config: &ReasoningConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, PlanCheckError> {
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            PlanCheckError::config(format!("invalid reasoning endpoint '{endpoint}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PlanCheckError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Override the model configured in `[reasoning]`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Reasoner impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Reasoner for OpenRouterReasoner {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(task = %request.task, model = %self.model))]
    async fn reason(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ReasoningError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "reasoning endpoint returned an error");
            return Err(ReasoningError::Api {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ReasoningError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                ReasoningError::Transport(format!("failed to read body: {e}"))
            }
        })?;

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ReasoningError::ResponseParse(format!(
                "invalid completion envelope: {e} (got: {})",
                snippet(&text)
            ))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                latency_ms = start.elapsed().as_millis(),
                "completion received"
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReasoningError::ResponseParse("completion has no content".into()))?;

        parse_json_payload(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ReasoningConfig {
        ReasoningConfig {
            base_url: format!("{}/api/v1/", server.uri()),
            model: "test/model".into(),
            request_timeout_secs: 1,
            ..ReasoningConfig::default()
        }
    }

    fn completion(content: &str) -> Value {
        json!({
            "id": "gen-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 40 }
        })
    }

    fn request() -> ReasoningRequest {
        ReasoningRequest::new(
            "risk",
            "You are a structural risk assessor.",
            r#"{"totalFloors": 8}"#,
        )
    }

    #[tokio::test]
    async fn returns_parsed_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(r#"{"riskIndex": 35, "level": "Low"}"#)),
            )
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "test-key").unwrap();
        let value = reasoner.reason(&request()).await.unwrap();

        assert_eq!(value["riskIndex"], 35);
        assert_eq!(value["level"], "Low");
    }

    #[tokio::test]
    async fn fenced_content_is_recovered() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("```json\n{\"total\": 5000000}\n```")),
            )
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "k").unwrap();
        let value = reasoner.reason(&request()).await.unwrap();
        assert_eq!(value["total"], 5_000_000);
    }

    #[tokio::test]
    async fn http_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "k").unwrap();
        let err = reasoner.reason(&request()).await.unwrap_err();

        assert_eq!(
            err,
            ReasoningError::Api {
                status: 429,
                body: "rate limited".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_content_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("I am unable to review this.")),
            )
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "k").unwrap();
        let err = reasoner.reason(&request()).await.unwrap_err();
        assert!(matches!(err, ReasoningError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn missing_choices_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "k").unwrap();
        let err = reasoner.reason(&request()).await.unwrap_err();
        assert!(matches!(err, ReasoningError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("{}"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let reasoner = OpenRouterReasoner::new(&config_for(&server), "k").unwrap();
        let err = reasoner.reason(&request()).await.unwrap_err();
        assert_eq!(err, ReasoningError::Timeout { secs: 1 });
    }

    #[test]
    fn model_override() {
        let reasoner = OpenRouterReasoner::new(&ReasoningConfig::default(), "k")
            .unwrap()
            .with_model("anthropic/claude-sonnet-4");
        assert_eq!(reasoner.model(), "anthropic/claude-sonnet-4");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = ReasoningConfig {
            base_url: "::not-a-url".into(),
            ..ReasoningConfig::default()
        };
        let err = OpenRouterReasoner::new(&config, "k").err().expect("should fail");
        assert!(err.to_string().contains("invalid reasoning endpoint"));
    }
}
