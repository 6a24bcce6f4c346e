//! Error taxonomy for graph sync operations.
//!
//! Driver errors are caught at the connection-manager / exporter boundary
//! and re-raised as one of these variants; `neo4rs` error types never
//! reach callers of this crate.

use std::fmt;

use docweave_db::DbError;
use thiserror::Error;

/// Which half of an export a failed batch belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Nodes,
    Edges,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Nodes => write!(f, "node"),
            BatchKind::Edges => write!(f, "edge"),
        }
    }
}

/// Error type for graph sync operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Neo4j is unreachable. Retryable once the service is back.
    #[error("Graph service unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected. Not retryable without new configuration.
    #[error("Graph authentication rejected: {0}")]
    AuthRejected(String),

    /// Any other driver-level failure.
    #[error("Graph driver error: {0}")]
    Driver(String),

    /// A whole batch was rolled back. The index tells the caller which
    /// slice of the export to re-run with a targeted sync.
    #[error("{kind} batch {index} failed: {source}")]
    BatchFailed {
        kind: BatchKind,
        index: usize,
        #[source]
        source: Box<GraphError>,
    },

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Result type for graph sync operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Map a raw driver error onto the taxonomy.
///
/// neo4rs does not expose a stable machine-readable split between
/// "host unreachable" and "bad credentials" across its error variants,
/// so beyond the explicit `ConnectionError` case this falls back to
/// inspecting the rendered message.
pub(crate) fn classify_driver_error(err: neo4rs::Error) -> GraphError {
    let detail = err.to_string();
    let lowered = detail.to_lowercase();
    if lowered.contains("auth") || lowered.contains("credential") || lowered.contains("unauthorized")
    {
        return GraphError::AuthRejected(detail);
    }
    if matches!(err, neo4rs::Error::ConnectionError)
        || lowered.contains("io error")
        || lowered.contains("connection refused")
        || lowered.contains("timed out")
        || lowered.contains("unreachable")
    {
        return GraphError::Unavailable(detail);
    }
    GraphError::Driver(detail)
}
