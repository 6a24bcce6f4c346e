//! # docweave-graph
//!
//! Neo4j projection and sync engine for docweave.
//!
//! Reads Node/Edge records from the SQLite source of truth, projects
//! them into a Neo4j property graph in transactional batches, and
//! verifies that the two stores agree.

pub mod client;
pub mod error;
pub mod export;
pub mod ident;
pub mod props;
pub mod schema;
pub mod statement;
pub mod sync;
pub mod verify;

pub use client::{GraphConfig, GraphManager};
pub use error::{BatchKind, GraphError, GraphResult};
pub use export::{BatchExporter, ExportStats, DEFAULT_BATCH_SIZE};
pub use ident::{normalize_label, normalize_relationship_type};
pub use props::coerce_properties;
pub use statement::WriteMode;
pub use sync::{SyncOrchestrator, SyncReport};
pub use verify::{GraphInventory, VerificationResult};
