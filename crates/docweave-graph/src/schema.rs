//! Best-effort Neo4j index creation.
//!
//! Labels are derived from author-defined entity types, so indexes are
//! created per label as the exporter first sees it. Index creation is a
//! performance optimization, not a correctness requirement: failures are
//! logged and swallowed.

use neo4rs::Query;
use tracing::{debug, warn};

use crate::client::GraphManager;

/// Create an id index for one label, if it does not already exist.
///
/// `label` must already be a normalized token; it is interpolated into
/// the statement because Cypher cannot parameterize schema identifiers.
pub async fn ensure_node_index(manager: &GraphManager, label: &str) {
    let statement = format!(
        "CREATE INDEX docweave_{}_id IF NOT EXISTS FOR (n:{label}) ON (n.id)",
        label.to_lowercase()
    );
    match manager.run(Query::new(statement)).await {
        Ok(()) => debug!(label, "Ensured id index"),
        Err(e) => warn!(label, error = %e, "Index creation failed; continuing without index"),
    }
}
