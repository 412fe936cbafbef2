use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, info, warn};
use vectorrag_common::{RagError, Result, StoreSettings};

use crate::retriever::Neo4jVectorRetriever;

/// Index introspection, filtered by name
pub const INDEX_LOOKUP_QUERY: &str =
    "SHOW INDEXES YIELD name, type WHERE name = $name RETURN name, type";

const CONNECTIVITY_QUERY: &str = "RETURN 1";

/// Graph database operations needed before retrieval
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fail with a connectivity error if the store is unreachable or rejects the credentials
    async fn verify_connectivity(&self) -> Result<()>;

    /// Whether exactly one index with this name exists
    async fn index_exists(&self, name: &str) -> Result<bool>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&self) -> Result<()>;
}

/// Shared, closable handle to the driver's connection pool
#[derive(Clone, Default)]
pub(crate) struct GraphHandle {
    inner: Arc<Mutex<Option<Graph>>>,
}

impl GraphHandle {
    pub(crate) fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(graph))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Graph>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clone of the open graph, `None` once closed
    pub(crate) fn get(&self) -> Option<Graph> {
        self.lock().clone()
    }

    pub(crate) fn take(&self) -> Option<Graph> {
        self.lock().take()
    }
}

/// Neo4j-backed graph store
pub struct Neo4jStore {
    uri: String,
    handle: GraphHandle,
}

impl Neo4jStore {
    /// Open an authenticated connection pool
    pub fn connect(settings: &StoreSettings) -> Result<Self> {
        info!("Connecting to Neo4j at {}", settings.uri);

        let graph = Graph::new(&settings.uri, &settings.username, &settings.password).map_err(
            |e| {
                RagError::connectivity(format!(
                    "Failed to connect to Neo4j at {}: {}",
                    settings.uri, e
                ))
            },
        )?;

        Ok(Self {
            uri: settings.uri.clone(),
            handle: GraphHandle::new(graph),
        })
    }

    /// Retriever sharing this store's connection
    pub fn retriever(&self) -> Neo4jVectorRetriever {
        Neo4jVectorRetriever::new(self.handle.clone())
    }

    fn graph(&self) -> Result<Graph> {
        self.handle.get().ok_or_else(|| {
            RagError::connectivity(format!("Connection to {} is already closed", self.uri))
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn verify_connectivity(&self) -> Result<()> {
        let graph = self.graph()?;

        graph.run(query(CONNECTIVITY_QUERY)).await.map_err(|e| {
            RagError::connectivity(format!("Neo4j at {} is unreachable: {}", self.uri, e))
        })?;

        info!("✓ Connected to Neo4j");
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool> {
        let graph = self.graph()?;

        let mut rows = graph
            .execute(query(INDEX_LOOKUP_QUERY).param("name", name))
            .await
            .map_err(|e| {
                RagError::connectivity(format!("Index lookup for '{}' failed: {}", name, e))
            })?;

        let mut matches = 0usize;
        while let Some(row) = rows.next().await.map_err(|e| {
            RagError::connectivity(format!("Index lookup for '{}' failed: {}", name, e))
        })? {
            matches += 1;

            if let Ok(index_type) = row.get::<String>("type") {
                if index_type != "VECTOR" {
                    warn!(
                        "Index '{}' exists but has type {}, similarity search may fail",
                        name, index_type
                    );
                }
            }
        }

        debug!("Index lookup for '{}' matched {} rows", name, matches);
        Ok(matches == 1)
    }

    async fn close(&self) -> Result<()> {
        match self.handle.take() {
            Some(graph) => {
                drop(graph);
                info!("Neo4j connection closed");
            }
            None => debug!("Neo4j connection already closed"),
        }
        Ok(())
    }
}
