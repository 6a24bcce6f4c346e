//! Batched export of relational records into Neo4j.
//!
//! Records are read from SQLite in pages and written in fixed-size
//! batches, each batch inside one explicit bolt transaction: the batch
//! commits as a unit or rolls back as a unit. All node batches commit
//! before the first edge batch starts — edges match their endpoints by
//! id, so the vertices must already exist.

use std::collections::{BTreeSet, HashSet};

use docweave_db::queries::edges::EdgeRow;
use docweave_db::queries::nodes::NodeRow;
use docweave_db::{queries, DbPool};
use neo4rs::{Graph, Query, Txn};
use tracing::{debug, info, warn};

use crate::client::GraphManager;
use crate::error::{classify_driver_error, BatchKind, GraphError, GraphResult};
use crate::schema;
use crate::statement::{edge_statement, node_statement, EdgeStatement, NodeStatement, WriteMode};

/// Records per transaction. Large enough to amortize the bolt round
/// trip, small enough to keep rollbacks and write load predictable.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Counters produced by one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    pub nodes_exported: usize,
    /// Edges that actually created/merged a relationship.
    pub edges_exported: usize,
    /// Edges whose source or target vertex was not found in the graph.
    pub edges_failed: usize,
    /// Records skipped because a required field was missing.
    pub records_skipped: usize,
    /// Distinct labels touched by this run.
    pub labels: BTreeSet<String>,
    /// Distinct relationship types touched by this run.
    pub relationship_types: BTreeSet<String>,
}

impl ExportStats {
    fn merge(&mut self, other: ExportStats) {
        self.nodes_exported += other.nodes_exported;
        self.edges_exported += other.edges_exported;
        self.edges_failed += other.edges_failed;
        self.records_skipped += other.records_skipped;
        self.labels.extend(other.labels);
        self.relationship_types.extend(other.relationship_types);
    }
}

/// Writes relational records into the graph in transactional batches.
pub struct BatchExporter<'a> {
    manager: &'a GraphManager,
    db: &'a DbPool,
    batch_size: usize,
}

impl<'a> BatchExporter<'a> {
    pub fn new(manager: &'a GraphManager, db: &'a DbPool) -> Self {
        Self {
            manager,
            db,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Export every node and edge record from the relational store.
    ///
    /// `clear_existing` first issues `MATCH (n) DETACH DELETE n` — the
    /// only destructive operation in the engine, used for force
    /// rebuilds — and then writes with plain CREATE statements. Without
    /// it, writes are MERGE-based upserts safe to re-run.
    pub async fn export_all(&self, clear_existing: bool) -> GraphResult<ExportStats> {
        let graph = self.manager.graph().await?;

        let mode = if clear_existing {
            info!("Clearing existing graph data before rebuild");
            self.manager
                .run(Query::new("MATCH (n) DETACH DELETE n".to_string()))
                .await?;
            WriteMode::Create
        } else {
            WriteMode::Upsert
        };

        let mut stats = ExportStats::default();
        let mut indexed_labels = HashSet::new();

        // Nodes first, fully committed before any edge batch.
        let mut offset = 0;
        let mut batch_index = 0;
        loop {
            let page = queries::nodes::list_nodes_page(self.db, self.batch_size, offset)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            self.write_node_batch(&graph, &page, mode, batch_index, &mut stats, &mut indexed_labels)
                .await?;
            batch_index += 1;
        }

        let mut offset = 0;
        let mut batch_index = 0;
        loop {
            let page = queries::edges::list_edges_page(self.db, self.batch_size, offset)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            self.write_edge_batch(&graph, &page, mode, batch_index, &mut stats)
                .await?;
            batch_index += 1;
        }

        info!(
            nodes = stats.nodes_exported,
            edges = stats.edges_exported,
            edges_failed = stats.edges_failed,
            skipped = stats.records_skipped,
            "Export complete"
        );
        Ok(stats)
    }

    /// Upsert a specific set of node records (targeted sync).
    pub async fn export_node_rows(&self, rows: &[NodeRow]) -> GraphResult<ExportStats> {
        let graph = self.manager.graph().await?;
        let mut stats = ExportStats::default();
        let mut indexed_labels = HashSet::new();
        for (batch_index, chunk) in rows.chunks(self.batch_size).enumerate() {
            self.write_node_batch(
                &graph,
                chunk,
                WriteMode::Upsert,
                batch_index,
                &mut stats,
                &mut indexed_labels,
            )
            .await?;
        }
        Ok(stats)
    }

    /// Upsert a specific set of edge records (targeted sync).
    pub async fn export_edge_rows(&self, rows: &[EdgeRow]) -> GraphResult<ExportStats> {
        let graph = self.manager.graph().await?;
        let mut stats = ExportStats::default();
        for (batch_index, chunk) in rows.chunks(self.batch_size).enumerate() {
            self.write_edge_batch(&graph, chunk, WriteMode::Upsert, batch_index, &mut stats)
                .await?;
        }
        Ok(stats)
    }

    async fn write_node_batch(
        &self,
        graph: &Graph,
        rows: &[NodeRow],
        mode: WriteMode,
        batch_index: usize,
        stats: &mut ExportStats,
        indexed_labels: &mut HashSet<String>,
    ) -> GraphResult<()> {
        let mut batch = ExportStats::default();
        let statements = build_node_statements(rows, mode, &mut batch);

        // Index creation cannot share a transaction with data writes,
        // and is best-effort anyway.
        for label in &batch.labels {
            if indexed_labels.insert(label.clone()) {
                schema::ensure_node_index(self.manager, label).await;
            }
        }

        if statements.is_empty() {
            stats.merge(batch);
            return Ok(());
        }

        let count = statements.len();
        let mut txn = graph
            .start_txn()
            .await
            .map_err(|e| batch_failed(BatchKind::Nodes, batch_index, classify_driver_error(e)))?;

        match apply_node_statements(&mut txn, statements).await {
            Ok(()) => {
                txn.commit().await.map_err(|e| {
                    batch_failed(BatchKind::Nodes, batch_index, classify_driver_error(e))
                })?;
                batch.nodes_exported = count;
                debug!(batch_index, count, "Committed node batch");
                stats.merge(batch);
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    warn!(batch_index, error = %rb, "Rollback failed after node batch error");
                }
                Err(batch_failed(BatchKind::Nodes, batch_index, e))
            }
        }
    }

    async fn write_edge_batch(
        &self,
        graph: &Graph,
        rows: &[EdgeRow],
        mode: WriteMode,
        batch_index: usize,
        stats: &mut ExportStats,
    ) -> GraphResult<()> {
        let mut batch = ExportStats::default();
        let statements = build_edge_statements(rows, mode, &mut batch);

        if statements.is_empty() {
            stats.merge(batch);
            return Ok(());
        }

        let mut txn = graph
            .start_txn()
            .await
            .map_err(|e| batch_failed(BatchKind::Edges, batch_index, classify_driver_error(e)))?;

        match apply_edge_statements(&mut txn, statements).await {
            Ok((created, dangling)) => {
                txn.commit().await.map_err(|e| {
                    batch_failed(BatchKind::Edges, batch_index, classify_driver_error(e))
                })?;
                batch.edges_exported = created;
                batch.edges_failed += dangling;
                debug!(batch_index, created, dangling, "Committed edge batch");
                stats.merge(batch);
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    warn!(batch_index, error = %rb, "Rollback failed after edge batch error");
                }
                Err(batch_failed(BatchKind::Edges, batch_index, e))
            }
        }
    }
}

fn batch_failed(kind: BatchKind, index: usize, source: GraphError) -> GraphError {
    GraphError::BatchFailed {
        kind,
        index,
        source: Box::new(source),
    }
}

async fn apply_node_statements(txn: &mut Txn, statements: Vec<NodeStatement>) -> GraphResult<()> {
    for stmt in statements {
        txn.run(stmt.into_query())
            .await
            .map_err(classify_driver_error)?;
    }
    Ok(())
}

/// Run edge statements, reading back each statement's `created` counter.
/// Returns `(created, dangling)`.
async fn apply_edge_statements(
    txn: &mut Txn,
    statements: Vec<EdgeStatement>,
) -> GraphResult<(usize, usize)> {
    let mut created_total = 0;
    let mut dangling = 0;
    for stmt in statements {
        let edge_id = stmt.edge_id.clone();
        let mut stream = txn
            .execute(stmt.into_query())
            .await
            .map_err(classify_driver_error)?;
        let created = match stream.next(txn.handle()).await.map_err(classify_driver_error)? {
            Some(row) => row
                .get::<i64>("created")
                .map_err(|e| GraphError::Driver(format!("missing 'created' counter: {:?}", e)))?,
            None => 0,
        };
        if created > 0 {
            created_total += 1;
        } else {
            warn!(edge_id = %edge_id, "Edge endpoints not found in graph; not exported");
            dangling += 1;
        }
    }
    Ok((created_total, dangling))
}

fn build_node_statements(
    rows: &[NodeRow],
    mode: WriteMode,
    stats: &mut ExportStats,
) -> Vec<NodeStatement> {
    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        if row.id.trim().is_empty() || row.name.trim().is_empty() {
            warn!(node_id = %row.id, "Skipping node record with missing required field");
            stats.records_skipped += 1;
            continue;
        }
        let stmt = node_statement(row, mode);
        stats.labels.insert(stmt.label.clone());
        statements.push(stmt);
    }
    statements
}

fn build_edge_statements(
    rows: &[EdgeRow],
    mode: WriteMode,
    stats: &mut ExportStats,
) -> Vec<EdgeStatement> {
    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        if row.id.trim().is_empty()
            || row.source_id.trim().is_empty()
            || row.target_id.trim().is_empty()
        {
            warn!(edge_id = %row.id, "Skipping edge record with missing required field");
            stats.records_skipped += 1;
            continue;
        }
        let stmt = edge_statement(row, mode);
        stats.relationship_types.insert(stmt.rel_type.clone());
        statements.push(stmt);
    }
    statements
}
