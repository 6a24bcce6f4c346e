//! SQLite to Neo4j synchronization orchestration.
//!
//! The orchestrator is the public entry point: full sync, targeted
//! (subset) sync and verification. It owns the graph connection for the
//! duration of a run and never retries internally — on failure the
//! caller decides whether to re-invoke, typically with a targeted sync
//! for the batch reported in the error.

use std::time::Instant;

use docweave_db::{queries, DbPool};
use tracing::info;

use crate::client::{GraphConfig, GraphManager};
use crate::error::GraphResult;
use crate::export::{BatchExporter, ExportStats, DEFAULT_BATCH_SIZE};
use crate::verify::{self, GraphInventory, VerificationResult};

/// Result of a full or per-document sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub stats: ExportStats,
    pub duration_seconds: f64,
}

/// Coordinates export and verification against one graph connection.
pub struct SyncOrchestrator {
    manager: GraphManager,
    db: DbPool,
    batch_size: usize,
}

impl SyncOrchestrator {
    /// Create an orchestrator. No connection is established until the
    /// first sync or verify call.
    pub fn new(config: GraphConfig, db: DbPool) -> Self {
        Self {
            manager: GraphManager::new(config),
            db,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Project every record from the relational store into the graph.
    ///
    /// `force` clears the graph first and rebuilds with CREATE
    /// statements — afterwards the graph contains exactly the current
    /// relational records. Without `force`, writes are upserts and
    /// re-running on unchanged data changes nothing.
    pub async fn sync_all(&self, force: bool) -> GraphResult<SyncReport> {
        info!(force, "Starting full graph sync");
        let started = Instant::now();

        let exporter = self.exporter();
        let stats = exporter.export_all(force).await?;

        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            nodes = stats.nodes_exported,
            edges = stats.edges_exported,
            duration_seconds,
            "Full sync complete"
        );
        Ok(SyncReport {
            stats,
            duration_seconds,
        })
    }

    /// Upsert a named subset of nodes. Returns the number exported.
    pub async fn sync_nodes(&self, ids: &[String]) -> GraphResult<usize> {
        let rows = queries::nodes::get_nodes_by_ids(&self.db, ids)?;
        let stats = self.exporter().export_node_rows(&rows).await?;
        Ok(stats.nodes_exported)
    }

    /// Upsert a named subset of edges. Returns the number that actually
    /// created or refreshed a relationship; dangling edges are logged
    /// and excluded.
    pub async fn sync_edges(&self, ids: &[String]) -> GraphResult<usize> {
        let rows = queries::edges::get_edges_by_ids(&self.db, ids)?;
        let stats = self.exporter().export_edge_rows(&rows).await?;
        Ok(stats.edges_exported)
    }

    /// Upsert all records extracted from one source document, nodes
    /// before edges, without touching unrelated data.
    pub async fn sync_document(&self, document_id: &str) -> GraphResult<SyncReport> {
        info!(document_id, "Starting per-document sync");
        let started = Instant::now();

        let nodes = queries::nodes::list_nodes_for_document(&self.db, document_id)?;
        let edges = queries::edges::list_edges_for_document(&self.db, document_id)?;

        let exporter = self.exporter();
        let mut stats = exporter.export_node_rows(&nodes).await?;
        let edge_stats = exporter.export_edge_rows(&edges).await?;
        stats.edges_exported += edge_stats.edges_exported;
        stats.edges_failed += edge_stats.edges_failed;
        stats.records_skipped += edge_stats.records_skipped;
        stats.relationship_types.extend(edge_stats.relationship_types);

        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            document_id,
            nodes = stats.nodes_exported,
            edges = stats.edges_exported,
            duration_seconds,
            "Per-document sync complete"
        );
        Ok(SyncReport {
            stats,
            duration_seconds,
        })
    }

    /// Live graph-side counts and inventories.
    pub async fn validate_export(&self) -> GraphResult<GraphInventory> {
        verify::validate_export(&self.manager).await
    }

    /// Compare authoritative counts from both stores.
    pub async fn verify_sync(&self) -> GraphResult<VerificationResult> {
        verify::verify_sync(&self.manager, &self.db).await
    }

    /// Drop the graph connection.
    pub async fn close(&self) {
        self.manager.close().await;
    }

    fn exporter(&self) -> BatchExporter<'_> {
        BatchExporter::new(&self.manager, &self.db).with_batch_size(self.batch_size)
    }
}
