//! Sync verification.
//!
//! Counts are taken live from both stores rather than from export
//! statistics, so drift introduced outside a sync run is still caught.
//! Verification is count equality per kind: a net-zero diff passes even
//! if individual records differ. Content-level diffing is out of scope.

use docweave_db::{queries, DbPool};
use neo4rs::Query;
use tracing::info;

use crate::client::GraphManager;
use crate::error::{GraphError, GraphResult};

/// Authoritative state of the graph store.
#[derive(Debug, Clone)]
pub struct GraphInventory {
    pub node_count: i64,
    pub relationship_count: i64,
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
}

/// Paired counts from both stores.
///
/// `in_sync` is purely count-based; the label and relationship-type
/// inventories are for operator diagnosis and play no part in pass/fail.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub relational_nodes: i64,
    pub graph_nodes: i64,
    /// relational minus graph; positive means the graph is missing nodes.
    pub node_diff: i64,
    pub relational_edges: i64,
    pub graph_edges: i64,
    pub edge_diff: i64,
    pub in_sync: bool,
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
}

impl VerificationResult {
    fn new(
        relational_nodes: i64,
        relational_edges: i64,
        inventory: GraphInventory,
    ) -> Self {
        let node_diff = relational_nodes - inventory.node_count;
        let edge_diff = relational_edges - inventory.relationship_count;
        Self {
            relational_nodes,
            graph_nodes: inventory.node_count,
            node_diff,
            relational_edges,
            graph_edges: inventory.relationship_count,
            edge_diff,
            in_sync: node_diff == 0 && edge_diff == 0,
            labels: inventory.labels,
            relationship_types: inventory.relationship_types,
        }
    }
}

/// Query the graph store for its vertex/relationship counts and
/// label/type inventories.
pub async fn validate_export(manager: &GraphManager) -> GraphResult<GraphInventory> {
    let node_count = manager
        .fetch_scalar::<i64>(
            Query::new("MATCH (n) RETURN count(n) AS count".to_string()),
            "count",
        )
        .await?
        .unwrap_or(0);

    let relationship_count = manager
        .fetch_scalar::<i64>(
            Query::new("MATCH ()-[r]->() RETURN count(r) AS count".to_string()),
            "count",
        )
        .await?
        .unwrap_or(0);

    let labels = fetch_strings(
        manager,
        "MATCH (n) UNWIND labels(n) AS label RETURN DISTINCT label AS value ORDER BY value",
    )
    .await?;

    let relationship_types = fetch_strings(
        manager,
        "MATCH ()-[r]->() RETURN DISTINCT type(r) AS value ORDER BY value",
    )
    .await?;

    Ok(GraphInventory {
        node_count,
        relationship_count,
        labels,
        relationship_types,
    })
}

/// Compare authoritative counts from both stores.
pub async fn verify_sync(manager: &GraphManager, db: &DbPool) -> GraphResult<VerificationResult> {
    let relational_nodes = queries::nodes::count_nodes(db)?;
    let relational_edges = queries::edges::count_edges(db)?;
    let inventory = validate_export(manager).await?;

    let result = VerificationResult::new(relational_nodes, relational_edges, inventory);
    info!(
        relational_nodes = result.relational_nodes,
        graph_nodes = result.graph_nodes,
        relational_edges = result.relational_edges,
        graph_edges = result.graph_edges,
        in_sync = result.in_sync,
        "Verification complete"
    );
    Ok(result)
}

async fn fetch_strings(manager: &GraphManager, cypher: &str) -> GraphResult<Vec<String>> {
    let rows = manager.fetch_all(Query::new(cypher.to_string())).await?;
    rows.into_iter()
        .map(|row| {
            row.get::<String>("value")
                .map_err(|e| GraphError::Driver(format!("missing field 'value': {:?}", e)))
        })
        .collect()
}
