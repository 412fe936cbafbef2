//! vectorrag LLM Integration
//!
//! OpenAI-compatible API client, query embedding and answer generation

mod client;
mod embedder;
mod generator;
mod prompts;
mod types;

pub use client::OpenAiClient;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use generator::{AnswerGenerator, RagGenerator};
pub use prompts::{format_context, rag_prompt, EMPTY_CONTEXT, SYSTEM_INSTRUCTION};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, Role,
};
