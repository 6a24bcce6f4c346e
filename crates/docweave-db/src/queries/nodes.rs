//! Node record queries.

use crate::pool::{DbError, DbPool, DbResult};
use rusqlite::{params, params_from_iter, Row};

/// Node row from database — one extracted entity.
#[derive(Debug, Clone)]
pub struct NodeRow {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    /// JSON object with extraction-specific properties, if any.
    pub structured_data: Option<String>,
    /// Source document this entity was extracted from.
    pub document_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const NODE_COLUMNS: &str = "id, name, entity_type, structured_data, document_id, created_at, updated_at";

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok(NodeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        entity_type: row.get(2)?,
        structured_data: row.get(3)?,
        document_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a new node record.
pub fn create_node(
    pool: &DbPool,
    id: &str,
    name: &str,
    entity_type: &str,
    structured_data: Option<&str>,
    document_id: Option<&str>,
) -> DbResult<()> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO nodes (id, name, entity_type, structured_data, document_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, entity_type, structured_data, document_id],
        )?;
        Ok(())
    })
}

/// Get a node by ID.
pub fn get_node(pool: &DbPool, id: &str) -> DbResult<NodeRow> {
    pool.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
            params![id],
            node_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("Node: {}", id)),
            e => DbError::Connection(e),
        })
    })
}

/// List one page of nodes in insertion order.
///
/// The sync engine pages through this rather than materializing the whole
/// table, to bound memory on large extractions.
pub fn list_nodes_page(pool: &DbPool, limit: usize, offset: usize) -> DbResult<Vec<NodeRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes ORDER BY rowid LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], node_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// Get nodes matching a set of IDs. Missing IDs are silently absent
/// from the result.
pub fn get_nodes_by_ids(pool: &DbPool, ids: &[String]) -> DbResult<Vec<NodeRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    pool.with_conn(|conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id IN ({placeholders}) ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), node_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// List all nodes extracted from one source document.
pub fn list_nodes_for_document(pool: &DbPool, document_id: &str) -> DbResult<Vec<NodeRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE document_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map(params![document_id], node_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
}

/// Authoritative node count.
pub fn count_nodes(pool: &DbPool) -> DbResult<i64> {
    pool.with_conn(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn test_pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn test_create_and_get_node() {
        let pool = test_pool();
        create_node(
            &pool,
            "n1",
            "Alice",
            "Person",
            Some(r#"{"age": 34}"#),
            Some("doc-1"),
        )
        .unwrap();

        let node = get_node(&pool, "n1").unwrap();
        assert_eq!(node.name, "Alice");
        assert_eq!(node.entity_type, "Person");
        assert_eq!(node.structured_data.as_deref(), Some(r#"{"age": 34}"#));
        assert_eq!(node.document_id.as_deref(), Some("doc-1"));
    }

    #[test]
    fn test_opaque_ids_round_trip() {
        // Callers typically use UUIDs; the store treats ids as opaque.
        let pool = test_pool();
        let id = uuid::Uuid::new_v4().to_string();
        create_node(&pool, &id, "Widget", "Component", None, None).unwrap();
        assert_eq!(get_node(&pool, &id).unwrap().id, id);
    }

    #[test]
    fn test_get_node_not_found() {
        let pool = test_pool();
        let err = get_node(&pool, "missing").unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_paging_preserves_insertion_order() {
        let pool = test_pool();
        for i in 0..5 {
            create_node(&pool, &format!("n{i}"), &format!("Node {i}"), "Thing", None, None).unwrap();
        }

        let first = list_nodes_page(&pool, 2, 0).unwrap();
        let second = list_nodes_page(&pool, 2, 2).unwrap();
        let third = list_nodes_page(&pool, 2, 4).unwrap();

        let ids: Vec<_> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(ids, vec!["n0", "n1", "n2", "n3", "n4"]);
    }

    #[test]
    fn test_get_nodes_by_ids_skips_missing() {
        let pool = test_pool();
        create_node(&pool, "a", "A", "Thing", None, None).unwrap();
        create_node(&pool, "b", "B", "Thing", None, None).unwrap();

        let found = get_nodes_by_ids(&pool, &["a".into(), "zzz".into()]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");

        assert!(get_nodes_by_ids(&pool, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_document_scope_and_count() {
        let pool = test_pool();
        create_node(&pool, "a", "A", "Thing", None, Some("doc-1")).unwrap();
        create_node(&pool, "b", "B", "Thing", None, Some("doc-2")).unwrap();

        let scoped = list_nodes_for_document(&pool, "doc-1").unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(count_nodes(&pool).unwrap(), 2);
    }
}
