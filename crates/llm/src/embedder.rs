use async_trait::async_trait;
use tracing::info;
use vectorrag_common::Result;

use crate::client::OpenAiClient;

/// Converts text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder backed by a remote embedding model
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        info!("Embedding query with {}", self.model);
        self.client.embed(&self.model, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embedder_uses_configured_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"model": "text-embedding-3-small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OpenAiClient::with_base_url("sk-test", server.uri(), Duration::from_secs(5), 0).unwrap();
        let embedder = OpenAiEmbedder::new(client, "text-embedding-3-small");

        assert_eq!(embedder.embed("space").await.unwrap(), vec![1.0, 0.0]);
    }
}
