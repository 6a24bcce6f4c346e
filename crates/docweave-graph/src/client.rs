//! Neo4j connection management.
//!
//! The manager is created cheaply and connects lazily on first use:
//! Unconnected → Connecting → Ready, or → Failed when the handshake or
//! the connectivity ping fails. Ready goes back to Unconnected only on
//! an explicit [`GraphManager::close`]; there is no automatic
//! reconnection mid-run — a broken connection aborts the run and the
//! caller decides whether to re-invoke.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{classify_driver_error, GraphError, GraphResult};

/// Configuration for connecting to Neo4j.
///
/// URI and credentials are supplied by the caller at construction time;
/// the engine never reads configuration files or environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "docweave_dev_2026".to_string(),
        }
    }
}

enum ConnState {
    Unconnected,
    Ready(Graph),
    Failed(String),
}

/// Lazily-connecting handle to the graph store.
///
/// Owned by one sync orchestrator for the duration of a run and passed
/// by reference to the exporter and verifier; never shared across
/// concurrent runs.
pub struct GraphManager {
    config: GraphConfig,
    state: Mutex<ConnState>,
}

impl GraphManager {
    /// Create a manager without touching the network.
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ConnState::Unconnected),
        }
    }

    /// Get the live connection pool, connecting on first use.
    ///
    /// neo4rs uses a lazy pool — building it does not establish a bolt
    /// connection, so a `RETURN 1` ping follows to force the handshake
    /// and surface unreachable-host and bad-credential failures here
    /// rather than in the middle of an export.
    pub async fn graph(&self) -> GraphResult<Graph> {
        let mut state = self.state.lock().await;
        match &*state {
            ConnState::Ready(graph) => return Ok(graph.clone()),
            ConnState::Failed(detail) => {
                return Err(GraphError::Unavailable(format!(
                    "connection previously failed (close() to reset): {detail}"
                )));
            }
            ConnState::Unconnected => {}
        }

        debug!(uri = %self.config.uri, "Connecting to Neo4j");
        match self.connect().await {
            Ok(graph) => {
                info!(uri = %self.config.uri, "Neo4j connection ready");
                *state = ConnState::Ready(graph.clone());
                Ok(graph)
            }
            Err(e) => {
                *state = ConnState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn connect(&self) -> GraphResult<Graph> {
        let config = ConfigBuilder::default()
            .uri(&self.config.uri)
            .user(&self.config.user)
            .password(&self.config.password)
            .db("neo4j")
            .max_connections(4)
            .fetch_size(200)
            .build()
            .map_err(classify_driver_error)?;

        let graph = Graph::connect(config).await.map_err(classify_driver_error)?;

        // Connectivity check before reporting Ready.
        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(classify_driver_error)?;

        Ok(graph)
    }

    /// Drop the connection and return to Unconnected. Also clears a
    /// Failed state so a later call may retry.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        *state = ConnState::Unconnected;
    }

    /// Execute a Cypher query that returns no results.
    pub async fn run(&self, query: Query) -> GraphResult<()> {
        let graph = self.graph().await?;
        graph.run(query).await.map_err(classify_driver_error)
    }

    /// Execute a Cypher query and collect all result rows.
    pub async fn fetch_all(&self, query: Query) -> GraphResult<Vec<neo4rs::Row>> {
        let graph = self.graph().await?;
        let mut result = graph.execute(query).await.map_err(classify_driver_error)?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.map_err(classify_driver_error)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn fetch_scalar<T: DeserializeOwned>(
        &self,
        query: Query,
        field: &str,
    ) -> GraphResult<Option<T>> {
        let rows = self.fetch_all(query).await?;
        if let Some(row) = rows.into_iter().next() {
            let val: T = row
                .get(field)
                .map_err(|e| GraphError::Driver(format!("missing field '{}': {:?}", field, e)))?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_construction_does_not_connect() {
        // Points at a closed port; constructing must not touch it.
        let manager = GraphManager::new(GraphConfig {
            uri: "bolt://127.0.0.1:1".to_string(),
            ..GraphConfig::default()
        });
        let state = manager.state.lock().await;
        assert!(matches!(*state, ConnState::Unconnected));
    }

    #[tokio::test]
    async fn test_close_resets_failed_state() {
        let manager = GraphManager::new(GraphConfig::default());
        {
            let mut state = manager.state.lock().await;
            *state = ConnState::Failed("boom".to_string());
        }
        manager.close().await;
        let state = manager.state.lock().await;
        assert!(matches!(*state, ConnState::Unconnected));
    }
}
