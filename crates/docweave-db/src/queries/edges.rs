//! Edge record queries.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, params_from_iter, Row};

/// Edge row from database — one extracted relationship.
#[derive(Debug, Clone)]
pub struct EdgeRow {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub edge_type: String,
    /// JSON object with extraction-specific properties, if any.
    pub structured_data: Option<String>,
    /// Source document this relationship was extracted from.
    pub document_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const EDGE_COLUMNS: &str =
    "id, source_id, target_id, edge_type, structured_data, document_id, created_at, updated_at";

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok(EdgeRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        target_id: row.get(2)?,
        edge_type: row.get(3)?,
        structured_data: row.get(4)?,
        document_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a new edge record.
pub fn create_edge(
    pool: &DbPool,
    id: &str,
    source_id: &str,
    target_id: &str,
    edge_type: &str,
    structured_data: Option<&str>,
    document_id: Option<&str>,
) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO edges (id, source_id, target_id, edge_type, structured_data, document_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, source_id, target_id, edge_type, structured_data, document_id],
        )?;
        Ok(())
    })
}

/// Get an edge by ID.
pub fn get_edge(pool: &DbPool, id: &str) -> DbResult<EdgeRow> {
    pool.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {EDGE_COLUMNS} FROM edges WHERE id = ?1"),
            params![id],
            edge_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("Edge: {}", id)),
            e => DbError::Connection(e),
        })
    })
}

/// List one page of edges in insertion order.
pub fn list_edges_page(pool: &DbPool, limit: usize, offset: usize) -> DbResult<Vec<EdgeRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges ORDER BY rowid LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], edge_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// Get edges matching a set of IDs. Missing IDs are silently absent
/// from the result.
pub fn get_edges_by_ids(pool: &DbPool, ids: &[String]) -> DbResult<Vec<EdgeRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    pool.with_conn(|conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges WHERE id IN ({placeholders}) ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), edge_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// List all edges extracted from one source document.
pub fn list_edges_for_document(pool: &DbPool, document_id: &str) -> DbResult<Vec<EdgeRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM edges WHERE document_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![document_id], edge_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// Authoritative edge count.
pub fn count_edges(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::nodes::create_node;

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn test_create_and_get_edge() {
        let pool = test_pool();
        create_node(&pool, "a", "Alice", "Person", None, None).unwrap();
        create_node(&pool, "b", "Bob", "Person", None, None).unwrap();
        create_edge(&pool, "e1", "a", "b", "works with", None, Some("doc-1")).unwrap();

        let edge = get_edge(&pool, "e1").unwrap();
        assert_eq!(edge.source_id, "a");
        assert_eq!(edge.target_id, "b");
        assert_eq!(edge.edge_type, "works with");
    }

    #[test]
    fn test_edge_without_endpoints_is_storable() {
        // Extraction may persist an edge before its endpoint entities;
        // the sync engine is what detects the dangling reference.
        let pool = test_pool();
        create_edge(&pool, "e1", "ghost-1", "ghost-2", "mentions", None, None).unwrap();
        assert_eq!(count_edges(&pool).unwrap(), 1);
    }

    #[test]
    fn test_edge_paging() {
        let pool = test_pool();
        for i in 0..3 {
            create_edge(&pool, &format!("e{i}"), "a", "b", "linked to", None, None).unwrap();
        }
        let page = list_edges_page(&pool, 2, 1).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "e1");
    }
}
