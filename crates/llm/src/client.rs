use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use vectorrag_common::{OpenAiSettings, RagError, Result};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};

/// Longest provider error body echoed into an error message
const MAX_ERROR_BODY: usize = 300;

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: Client,
    max_retries: u32,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// A failed request attempt
#[derive(Debug)]
struct Failure {
    message: String,
    /// Transport errors, 429 and 5xx may succeed on another attempt
    transient: bool,
}

impl Failure {
    fn transient(message: String) -> Self {
        Self {
            message,
            transient: true,
        }
    }

    fn fatal(message: String) -> Self {
        Self {
            message,
            transient: false,
        }
    }
}

type Attempt<T> = std::result::Result<T, Failure>;

impl OpenAiClient {
    /// Create new client from settings
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        Self::with_base_url(
            &settings.api_key,
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
            settings.max_retries,
        )
    }

    /// Create new client against an explicit base URL
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("OpenAI client initialized: {}", base_url);
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
            max_retries,
        })
    }

    /// Generate embedding for text
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        debug!("Generating embedding - Model: {}, Text length: {}", model, text.len());

        let request = EmbeddingRequest {
            model: model.to_string(),
            input: text.to_string(),
        };

        let embedding = self
            .with_retry("Embedding", RagError::embedding, || {
                self.try_embed(&url, &request)
            })
            .await?;

        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbeddingRequest) -> Attempt<Vec<f32>> {
        let mut result: EmbeddingResponse = self.post_json(url, request).await?;

        result.data.sort_by_key(|d| d.index);
        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default();

        if embedding.is_empty() {
            return Err(Failure::fatal(format!(
                "Empty embedding returned for model {}",
                request.model
            )));
        }

        Ok(embedding)
    }

    /// Run a chat completion and return the assistant message text
    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            "Sending chat request - Model: {}, Messages: {}, Prompt length: {}",
            request.model,
            request.messages.len(),
            request.messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let answer = self
            .with_retry("Chat completion", RagError::generation, || {
                self.try_chat(&url, request)
            })
            .await?;

        debug!("Received chat response - Length: {}", answer.len());
        Ok(answer)
    }

    /// Single attempt to run a chat completion
    async fn try_chat(&self, url: &str, request: &ChatRequest) -> Attempt<String> {
        let result: ChatResponse = self.post_json(url, request).await?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Failure::fatal("Response contained no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(Failure::fatal(format!("Model refused to answer: {}", refusal)));
        }

        match choice.finish_reason.as_deref() {
            None | Some("stop") => {}
            Some(reason) => warn!("Chat completion finished early: {}", reason),
        }

        let content = choice.message.content.unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(Failure::fatal(format!(
                "Empty response from model {}",
                request.model
            )));
        }

        Ok(content.to_string())
    }

    /// Attempt an operation, retrying transient failures with exponential backoff
    async fn with_retry<T, F, Fut>(
        &self,
        label: &str,
        classify: fn(String) -> RagError,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt: u32 = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.transient && attempt < attempts => {
                    let delay = Duration::from_secs(2u64.saturating_pow(attempt - 1));
                    warn!(
                        "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        label, attempt, attempts, failure.message, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(classify(failure.message)),
            }
        }
    }

    /// POST a JSON body and decode the JSON response
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Attempt<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Failure::transient(format!("Failed to send request to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!(
                "{} returned HTTP {}: {}",
                url,
                status.as_u16(),
                provider_message(&body)
            );
            return Err(if is_transient(status) {
                Failure::transient(message)
            } else {
                Failure::fatal(message)
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Failure::fatal(format!("Failed to parse response from {}: {}", url, e)))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Extract the provider's error message from a response body
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "<empty body>".to_string(),
        Err(_) => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_retries: u32) -> OpenAiClient {
        OpenAiClient::with_base_url("sk-test", server.uri(), Duration::from_secs(5), max_retries)
            .unwrap()
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::user("Which movies are about war?")],
            temperature: None,
        }
    }

    #[test]
    fn test_provider_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided.","type":"invalid_request_error"}}"#;
        assert_eq!(provider_message(body), "Incorrect API key provided.");
        assert_eq!(provider_message(""), "<empty body>");
        assert_eq!(provider_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = OpenAiClient::with_base_url(
            "sk-very-secret",
            "http://localhost:1/",
            Duration::from_secs(1),
            0,
        )
        .unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("\"http://localhost:1\""));
        assert!(!debug.contains("sk-very-secret"));
    }

    #[tokio::test]
    async fn test_embed_sends_model_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-ada-002",
                "input": "war movies"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
                "model": "text-embedding-ada-002"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedding = client_for(&server, 0)
            .embed("text-embedding-ada-002", "war movies")
            .await
            .unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_error_maps_to_embedding_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "You exceeded your current quota.", "type": "insufficient_quota"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 0)
            .embed("text-embedding-ada-002", "war movies")
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmbeddingProvider(_)));
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("exceeded your current quota"));
    }

    #[tokio::test]
    async fn test_embed_empty_data_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [],
                "model": "text-embedding-ada-002"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, 0)
            .embed("text-embedding-ada-002", "war movies")
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmbeddingProvider(_)));
    }

    #[tokio::test]
    async fn test_chat_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "  Glory and Patton.\n"},
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let answer = client_for(&server, 0).chat(&chat_request()).await.unwrap();
        assert_eq!(answer, "Glory and Patton.");
    }

    #[tokio::test]
    async fn test_chat_truncated_answer_is_still_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Glory, Patton and"},
                    "finish_reason": "length"
                }]
            })))
            .mount(&server)
            .await;

        let answer = client_for(&server, 0).chat(&chat_request()).await.unwrap();
        assert_eq!(answer, "Glory, Patton and");
    }

    #[tokio::test]
    async fn test_chat_malformed_response_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, 0).chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }

    #[tokio::test]
    async fn test_chat_no_choices_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, 0).chat(&chat_request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 0).chat(&chat_request()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_retry_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Recovered."}}]
            })))
            .mount(&server)
            .await;

        let answer = client_for(&server, 1).chat(&chat_request()).await.unwrap();
        assert_eq!(answer, "Recovered.");
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::BAD_GATEWAY));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided."}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 3)
            .embed("text-embedding-ada-002", "war movies")
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmbeddingProvider(_)));
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 3).chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }

    #[tokio::test]
    async fn test_huge_retry_count_does_not_overflow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5]}]
            })))
            .mount(&server)
            .await;

        let embedding = client_for(&server, u32::MAX)
            .embed("text-embedding-ada-002", "war movies")
            .await
            .unwrap();
        assert_eq!(embedding, vec![0.5]);
    }
}
