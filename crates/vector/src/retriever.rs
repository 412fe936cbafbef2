use async_trait::async_trait;
use neo4rs::query;
use tracing::{debug, info};
use vectorrag_common::{RagError, Record, Result};

use crate::store::GraphHandle;

/// Similarity search against a named vector index. Property names and the
/// query vector are bound as parameters, never interpolated.
pub const VECTOR_SEARCH_QUERY: &str =
    "CALL db.index.vector.queryNodes($index_name, $top_k, $embedding) \
     YIELD node, score \
     RETURN [key IN $properties | coalesce(toStringOrNull(node[key]), '')] AS values, score \
     ORDER BY score DESC";

/// Top-K similarity search over a vector index
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` records ordered by non-increasing score,
    /// each holding only `return_properties`
    async fn retrieve(
        &self,
        query_vector: &[f32],
        index_name: &str,
        top_k: usize,
        return_properties: &[String],
    ) -> Result<Vec<Record>>;
}

/// Retriever using Neo4j's native vector index procedures
#[derive(Clone)]
pub struct Neo4jVectorRetriever {
    handle: GraphHandle,
}

impl Neo4jVectorRetriever {
    pub(crate) fn new(handle: GraphHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Retriever for Neo4jVectorRetriever {
    async fn retrieve(
        &self,
        query_vector: &[f32],
        index_name: &str,
        top_k: usize,
        return_properties: &[String],
    ) -> Result<Vec<Record>> {
        debug!(
            "Searching index {} (top_k={}, dimension={}, properties={:?})",
            index_name,
            top_k,
            query_vector.len(),
            return_properties
        );

        let graph = self
            .handle
            .get()
            .ok_or_else(|| RagError::retrieval("Connection is already closed"))?;

        let embedding: Vec<f64> = query_vector.iter().map(|&x| f64::from(x)).collect();
        let search = query(VECTOR_SEARCH_QUERY)
            .param("index_name", index_name)
            .param("top_k", top_k as i64)
            .param("embedding", embedding)
            .param("properties", return_properties.to_vec());

        let search_failed = |e: neo4rs::Error| {
            RagError::retrieval(format!("Vector search on index '{}' failed: {}", index_name, e))
        };

        let mut rows = graph.execute(search).await.map_err(search_failed)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(search_failed)? {
            let values: Vec<String> = row.get("values").map_err(|e| {
                RagError::retrieval(format!("Unexpected record shape from '{}': {}", index_name, e))
            })?;
            let score: f64 = row.get("score").map_err(|e| {
                RagError::retrieval(format!("Missing score in result from '{}': {}", index_name, e))
            })?;

            records.push(Record::from_values(return_properties, values, score));
        }

        let total_candidates = records.len();
        let records = rank_records(records, top_k);

        info!(
            "Search completed - {} results (from {} candidates)",
            records.len(),
            total_candidates
        );
        Ok(records)
    }
}

/// Sort by score (descending, ties keep store order) and keep the top k
pub fn rank_records(mut records: Vec<Record>, top_k: usize) -> Vec<Record> {
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    records.truncate(top_k);
    records
}
