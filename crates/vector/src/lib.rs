//! vectorrag Graph Store and Vector Retrieval
//!
//! Neo4j connection handling, vector index introspection and
//! similarity search over a vector index

mod retriever;
mod store;

pub use retriever::{rank_records, Neo4jVectorRetriever, Retriever, VECTOR_SEARCH_QUERY};
pub use store::{GraphStore, Neo4jStore, INDEX_LOOKUP_QUERY};
