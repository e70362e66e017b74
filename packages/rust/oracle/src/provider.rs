//! OpenAI-compatible chat-completions backend for the classification oracle.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use prospector_shared::{OracleConfig, ProspectorError, Result, validate_api_key};

use crate::{ClassificationOracle, OracleTier};

/// User-Agent string for oracle requests.
const USER_AGENT: &str = concat!("Prospector/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// HttpOracle
// ---------------------------------------------------------------------------

/// Chat-completions oracle client with per-tier model and timeout.
#[derive(Debug)]
pub struct HttpOracle {
    client: Client,
    api_key: String,
    base_url: String,
    config: OracleConfig,
}

impl HttpOracle {
    /// Build an oracle client from config. Fails fast when the API key env
    /// var is missing — a misconfigured oracle must never surface mid-run.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = validate_api_key(&config.api_key_env, "oracle")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    fn model_for(&self, tier: OracleTier) -> &str {
        match tier {
            OracleTier::Basic => &self.config.basic_model,
            OracleTier::Reasoning => &self.config.reasoning_model,
        }
    }

    fn timeout_for(&self, tier: OracleTier) -> Duration {
        match tier {
            OracleTier::Basic => Duration::from_secs(self.config.basic_timeout_secs),
            OracleTier::Reasoning => Duration::from_secs(self.config.reasoning_timeout_secs),
        }
    }

    #[instrument(skip_all, fields(model = self.model_for(tier)))]
    async fn complete(&self, messages: Vec<ChatMessage<'_>>, tier: OracleTier) -> Result<String> {
        let model = self.model_for(tier);
        let request = ChatRequest {
            model,
            messages,
            // Reasoning calls get sampling headroom; judgments stay pinned.
            temperature: match tier {
                OracleTier::Basic => 0.0,
                OracleTier::Reasoning => 1.0,
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout_for(tier))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProspectorError::Oracle(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Oracle(format!("{url}: HTTP {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProspectorError::Oracle(format!("malformed response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProspectorError::Oracle("response contained no choices".into()))?;

        debug!(chars = content.len(), "oracle response received");
        Ok(content)
    }
}

#[async_trait::async_trait]
impl ClassificationOracle for HttpOracle {
    async fn classify(&self, prompt: &str, tier: OracleTier) -> Result<String> {
        self.complete(
            vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            tier,
        )
        .await
    }

    async fn generate(&self, system: &str, prompt: &str, tier: OracleTier) -> Result<String> {
        self.complete(
            vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            tier,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, key_env: &str) -> OracleConfig {
        // SAFETY: test-only env mutation with a test-unique variable name.
        unsafe { std::env::set_var(key_env, "test-key") };
        OracleConfig {
            api_key_env: key_env.into(),
            base_url: server.uri(),
            ..OracleConfig::default()
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn classify_returns_model_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("NOT_FIT")))
            .mount(&server)
            .await;

        let oracle = HttpOracle::new(&test_config(&server, "PROSPECTOR_TEST_ORACLE_KEY_A"))
            .expect("build oracle");
        let verdict = oracle
            .classify("Is this company a fit?", OracleTier::Basic)
            .await
            .expect("classify");
        assert_eq!(verdict, "NOT_FIT");
    }

    #[tokio::test]
    async fn generate_uses_reasoning_model_for_reasoning_tier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "o1-preview"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("profile text")))
            .mount(&server)
            .await;

        let oracle = HttpOracle::new(&test_config(&server, "PROSPECTOR_TEST_ORACLE_KEY_B"))
            .expect("build oracle");
        let text = oracle
            .generate("You are an analyst.", "Synthesize.", OracleTier::Reasoning)
            .await
            .expect("generate");
        assert_eq!(text, "profile text");
    }

    #[tokio::test]
    async fn http_error_surfaces_as_oracle_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let oracle = HttpOracle::new(&test_config(&server, "PROSPECTOR_TEST_ORACLE_KEY_C"))
            .expect("build oracle");
        let err = oracle
            .classify("prompt", OracleTier::Basic)
            .await
            .expect_err("should fail");
        assert!(matches!(err, ProspectorError::Oracle(_)));
    }

    #[tokio::test]
    async fn missing_api_key_fails_at_construction() {
        let config = OracleConfig {
            api_key_env: "PROSPECTOR_TEST_ORACLE_KEY_UNSET".into(),
            ..OracleConfig::default()
        };
        let err = HttpOracle::new(&config).expect_err("should fail");
        assert!(matches!(err, ProspectorError::Config { .. }));
    }
}
