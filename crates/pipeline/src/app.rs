use std::io::Write;
use std::sync::Arc;

use tracing::info;
use vectorrag_common::{AppConfig, Result};
use vectorrag_llm::{OpenAiClient, OpenAiEmbedder, RagGenerator};
use vectorrag_vector::Neo4jStore;

use crate::orchestrator::{Orchestrator, Stage};

/// Load configuration from the environment, apply overrides, validate.
///
/// Nothing touches the network until this succeeds.
pub fn load_config(overrides: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
    info!("Stage: {}", Stage::LoadConfig);

    let mut config = AppConfig::from_env()?;
    overrides(&mut config);
    config.validate()?;

    info!("Configuration loaded:");
    info!("  Store: {}", config.store.uri);
    info!("  Index: {}", config.query.index_name);
    info!("  Top-K: {}", config.query.top_k);
    info!(
        "  Models: {} (embedding), {} (generation)",
        config.openai.embedding_model, config.openai.llm_model
    );

    Ok(config)
}

/// Wire the real collaborators for a validated configuration and run one query
pub async fn run<W: Write>(config: &AppConfig, out: &mut W) -> Result<String> {
    let client = OpenAiClient::new(&config.openai)?;
    let embedder = Arc::new(OpenAiEmbedder::new(
        client.clone(),
        &config.openai.embedding_model,
    ));
    let generator = Arc::new(
        RagGenerator::new(client, &config.openai.llm_model)
            .with_temperature(config.openai.temperature),
    );

    info!("Stage: {}", Stage::OpenConnection);
    let store = Arc::new(Neo4jStore::connect(&config.store)?);
    let retriever = Arc::new(store.retriever());

    let orchestrator = Orchestrator::new(store, embedder, retriever, generator, config.query.clone());
    orchestrator.run(out).await
}
