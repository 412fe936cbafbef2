use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{error, info, warn};
use vectorrag_common::{QuerySettings, RagError, Record, Result};
use vectorrag_llm::{AnswerGenerator, Embedder};
use vectorrag_vector::{GraphStore, Retriever};

/// Run stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadConfig,
    OpenConnection,
    VerifyConnectivity,
    CheckIndex,
    EmbedQuery,
    Retrieve,
    Generate,
    PrintAnswer,
    CloseConnection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadConfig => "load-config",
            Self::OpenConnection => "open-connection",
            Self::VerifyConnectivity => "verify-connectivity",
            Self::CheckIndex => "check-index",
            Self::EmbedQuery => "embed-query",
            Self::Retrieve => "retrieve",
            Self::Generate => "generate",
            Self::PrintAnswer => "print-answer",
            Self::CloseConnection => "close-connection",
        };
        f.write_str(name)
    }
}

/// Runs one query against an open store connection.
///
/// The orchestrator owns the connection for the run and closes it exactly
/// once, whether the run succeeds or fails.
pub struct Orchestrator {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    query: QuerySettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        query: QuerySettings,
    ) -> Self {
        Self {
            store,
            embedder,
            retriever,
            generator,
            query,
        }
    }

    /// Execute the run, writing the query line and the answer to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<String> {
        let mut stage = Stage::VerifyConnectivity;
        let outcome = self.execute(out, &mut stage).await;

        if let Err(e) = &outcome {
            error!("Stage {} failed ({}): {}", stage, e.kind(), e);
        }

        info!("Stage: {}", Stage::CloseConnection);
        let closed = self.store.close().await;

        match (outcome, closed) {
            (Ok(answer), Ok(())) => Ok(answer),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close connection after error: {}", close_err);
                Err(e)
            }
        }
    }

    async fn execute<W: Write>(&self, out: &mut W, stage: &mut Stage) -> Result<String> {
        let query = &self.query;

        enter(stage, Stage::VerifyConnectivity);
        self.store.verify_connectivity().await?;

        enter(stage, Stage::CheckIndex);
        if !self.store.index_exists(&query.index_name).await? {
            return Err(RagError::missing_index(&query.index_name));
        }

        enter(stage, Stage::EmbedQuery);
        writeln!(out, "Query: {}\n", query.text)?;
        let query_vector = self.embedder.embed(&query.text).await?;

        enter(stage, Stage::Retrieve);
        let context = self
            .retriever
            .retrieve(
                &query_vector,
                &query.index_name,
                query.top_k,
                &query.return_properties,
            )
            .await?;

        if query.show_context {
            write_context(out, &context)?;
        }

        enter(stage, Stage::Generate);
        let answer = self.generator.generate(&query.text, &context).await?;

        enter(stage, Stage::PrintAnswer);
        writeln!(out, "\n{}", answer)?;
        out.flush()?;

        Ok(answer)
    }
}

fn enter(current: &mut Stage, next: Stage) {
    *current = next;
    info!("Stage: {}", next);
}

/// Print retrieved records, one numbered line per record
fn write_context<W: Write>(out: &mut W, context: &[Record]) -> Result<()> {
    writeln!(out, "Retrieved context ({} records):", context.len())?;
    for (i, record) in context.iter().enumerate() {
        let fields = record
            .properties
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join(" | ");
        writeln!(out, "  {}. [{:.3}] {}", i + 1, record.score, fields)?;
    }
    writeln!(out)?;
    Ok(())
}
