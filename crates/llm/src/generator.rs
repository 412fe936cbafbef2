use async_trait::async_trait;
use tracing::{debug, info};
use vectorrag_common::{Record, Result};

use crate::client::OpenAiClient;
use crate::prompts::{rag_prompt, SYSTEM_INSTRUCTION};
use crate::types::{ChatMessage, ChatRequest};

/// Produces a natural-language answer from a query and retrieved context
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, query: &str, context: &[Record]) -> Result<String>;
}

/// Answer generator backed by a remote chat model
pub struct RagGenerator {
    client: OpenAiClient,
    model: String,
    temperature: Option<f32>,
}

impl RagGenerator {
    /// Create new generator
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the chat request for a query
    pub fn build_request(&self, query: &str, context: &[Record]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(rag_prompt(query, context)),
            ],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl AnswerGenerator for RagGenerator {
    async fn generate(&self, query: &str, context: &[Record]) -> Result<String> {
        info!(
            "Generating answer with {} from {} context records",
            self.model,
            context.len()
        );

        let request = self.build_request(query, context);
        let answer = self.client.chat(&request).await?;

        debug!("Answer length: {} chars", answer.len());
        Ok(answer)
    }
}
