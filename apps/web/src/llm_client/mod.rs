/// LLM Client: the single point of entry for all chat-completion calls.
///
/// No other module may call the hosted model API directly.
/// Every call is independent: no streaming, no conversation history, no cache, no retry.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The model used for all generation calls.
pub const MODEL: &str = "gpt-3.5-turbo";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Transport-level failure of a chat-completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}, code {code:?}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// What the caller needs to know about a failed generation.
///
/// The provider's error codes are not a documented contract: anything we do not
/// recognise lands in `Unclassified`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation quota exhausted")]
    QuotaExhausted,

    #[error("invalid API credential")]
    InvalidCredential,

    #[error("requested model unavailable")]
    ModelUnavailable,

    #[error("generation failed: {0}")]
    Unclassified(String),
}

impl GenerationError {
    /// Message shown to the user on the generator form.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::QuotaExhausted => {
                "OpenAI API quota exceeded. Please check your API key billing status."
            }
            GenerationError::InvalidCredential => {
                "Invalid OpenAI API key. Please check your configuration."
            }
            GenerationError::ModelUnavailable => {
                "The requested AI model is currently unavailable. Please try again later."
            }
            GenerationError::Unclassified(_) => {
                "Failed to generate document. Please try again later."
            }
        }
    }

    /// Stable machine-readable code for the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::QuotaExhausted => "GENERATION_QUOTA_EXHAUSTED",
            GenerationError::InvalidCredential => "GENERATION_INVALID_CREDENTIAL",
            GenerationError::ModelUnavailable => "GENERATION_MODEL_UNAVAILABLE",
            GenerationError::Unclassified(_) => "GENERATION_FAILED",
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::Api {
                code: Some(code), ..
            } => match code.as_str() {
                "insufficient_quota" => GenerationError::QuotaExhausted,
                "invalid_api_key" => GenerationError::InvalidCredential,
                "model_not_found" => GenerationError::ModelUnavailable,
                _ => GenerationError::Unclassified(err.to_string()),
            },
            _ => GenerationError::Unclassified(err.to_string()),
        }
    }
}

/// A role-scoped prompt: one system instruction plus one user instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Anything that can turn a prompt into generated text.
/// `LlmClient` is the production implementation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &PromptPair) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Text of the first choice, if the model returned any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

/// Client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url,
        })
    }

    /// Makes one chat-completion call and returns the full response object.
    pub async fn call(&self, prompt: &PromptPair) -> Result<LlmResponse, LlmError> {
        let request_body = ChatCompletionRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(api_error(status.as_u16(), body));
        }

        let llm_response: LlmResponse = response.json().await?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &PromptPair) -> Result<String, GenerationError> {
        let response = self.call(prompt).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.to_string())
    }
}

/// Builds an `LlmError::Api` from a non-success response, pulling the provider's
/// error code out of `error.code`, falling back to `error.type`.
fn api_error(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<ProviderError>(&body) {
        Ok(parsed) => LlmError::Api {
            status,
            code: parsed.error.code.or(parsed.error.error_type),
            message: parsed.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            code: None,
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt() -> PromptPair {
        PromptPair {
            system: "You are a professional resume writer.".to_string(),
            user: "Create a professional resume.".to_string(),
        }
    }

    fn error_body(code: Option<&str>, error_type: &str) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "message": "provider says no",
                "type": error_type,
                "param": null,
                "code": code
            }
        })
    }

    async fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new("sk-test".to_string(), server.uri()).unwrap()
    }

    #[test]
    fn test_api_error_reads_code() {
        let body = error_body(Some("invalid_api_key"), "invalid_request_error").to_string();
        match api_error(401, body) {
            LlmError::Api { status, code, .. } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("invalid_api_key"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_type() {
        let body = error_body(None, "insufficient_quota").to_string();
        let err: GenerationError = api_error(429, body).into();
        assert_eq!(err, GenerationError::QuotaExhausted);
    }

    #[test]
    fn test_unrecognised_shapes_are_unclassified() {
        let err: GenerationError = api_error(500, "<html>bad gateway</html>".to_string()).into();
        assert!(matches!(err, GenerationError::Unclassified(_)));

        let body = error_body(Some("context_length_exceeded"), "invalid_request_error");
        let err: GenerationError = api_error(400, body.to_string()).into();
        assert!(matches!(err, GenerationError::Unclassified(_)));

        let err: GenerationError = LlmError::EmptyContent.into();
        assert!(matches!(err, GenerationError::Unclassified(_)));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let messages = [
            GenerationError::QuotaExhausted.user_message(),
            GenerationError::InvalidCredential.user_message(),
            GenerationError::ModelUnavailable.user_message(),
            GenerationError::Unclassified("x".to_string()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_response_text_ignores_blank_content() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "   "}}]
        }))
        .unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "JANE DOE\nEngineer"}}
                ],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).await.generate(&prompt()).await.unwrap();
        assert_eq!(text, "JANE DOE\nEngineer");
    }

    #[tokio::test]
    async fn test_request_carries_model_and_both_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        client_for(&server).await.generate(&prompt()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Create a professional resume.");
    }

    #[tokio::test]
    async fn test_quota_error_is_classified_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(error_body(Some("insufficient_quota"), "insufficient_quota")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .generate(&prompt())
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::QuotaExhausted);
    }

    #[tokio::test]
    async fn test_model_not_found_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(error_body(Some("model_not_found"), "invalid_request_error")),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .generate(&prompt())
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::ModelUnavailable);
    }
}
