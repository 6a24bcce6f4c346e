//! Cypher statement construction for node and edge projection.
//!
//! One statement per record, fully parameterized: the only text ever
//! interpolated is the normalized label / relationship-type token, which
//! is restricted to alphanumerics by the normalizer. Everything else
//! travels in the parameter map so the driver can batch safely.

use std::collections::HashMap;

use docweave_db::queries::edges::EdgeRow;
use docweave_db::queries::nodes::NodeRow;
use neo4rs::{BoltMap, BoltString, BoltType, Query};
use tracing::warn;

use crate::ident::{normalize_label, normalize_relationship_type};
use crate::props::coerce_properties;

/// How projected records are written to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Unconditional CREATE. Only safe against a cleared graph.
    Create,
    /// MERGE on the record id; re-running the same records is a no-op
    /// apart from property refresh.
    Upsert,
}

/// A built node statement, kept inspectable for tests and logging.
#[derive(Debug)]
pub struct NodeStatement {
    pub label: String,
    pub cypher: String,
    pub node_id: String,
    pub props: BoltMap,
}

impl NodeStatement {
    pub fn into_query(self) -> Query {
        Query::new(self.cypher)
            .param("id", self.node_id.as_str())
            .param("props", BoltType::Map(self.props))
    }
}

/// A built edge statement.
///
/// The cypher always ends in `RETURN count(r) AS created` so the executor
/// can observe whether the relationship was actually written — an
/// unresolved endpoint yields `created = 0`.
#[derive(Debug)]
pub struct EdgeStatement {
    pub rel_type: String,
    pub cypher: String,
    pub edge_id: String,
    pub source_id: String,
    pub target_id: String,
    pub props: BoltMap,
}

impl EdgeStatement {
    pub fn into_query(self) -> Query {
        Query::new(self.cypher)
            .param("id", self.edge_id.as_str())
            .param("source_id", self.source_id.as_str())
            .param("target_id", self.target_id.as_str())
            .param("props", BoltType::Map(self.props))
    }
}

/// Build the projection statement for one node record.
///
/// The property map carries `id`, `name` and the original, unnormalized
/// `entity_type` (for traceability back to the relational store) plus all
/// coerced structured_data entries. Record fields win over structured_data
/// keys of the same name.
pub fn node_statement(node: &NodeRow, mode: WriteMode) -> NodeStatement {
    let label = normalize_label(&node.entity_type);

    let mut props = structured_props(node.structured_data.as_deref(), &node.id);
    put(&mut props, "id", node.id.as_str());
    put(&mut props, "name", node.name.as_str());
    put(&mut props, "entity_type", node.entity_type.as_str());
    if let Some(ref doc) = node.document_id {
        put(&mut props, "document_id", doc.as_str());
    }

    let cypher = match mode {
        WriteMode::Create => format!("CREATE (n:{label}) SET n = $props"),
        WriteMode::Upsert => format!("MERGE (n:{label} {{id: $id}}) SET n += $props"),
    };

    NodeStatement {
        label,
        cypher,
        node_id: node.id.clone(),
        props,
    }
}

/// Build the projection statement for one edge record.
///
/// Endpoints are matched by id only; if either is missing the statement
/// creates nothing and reports `created = 0` instead of failing.
pub fn edge_statement(edge: &EdgeRow, mode: WriteMode) -> EdgeStatement {
    let rel_type = normalize_relationship_type(&edge.edge_type);

    let mut props = structured_props(edge.structured_data.as_deref(), &edge.id);
    put(&mut props, "id", edge.id.as_str());
    put(&mut props, "edge_type", edge.edge_type.as_str());
    if let Some(ref doc) = edge.document_id {
        put(&mut props, "document_id", doc.as_str());
    }

    let cypher = match mode {
        WriteMode::Create => format!(
            "MATCH (a {{id: $source_id}}), (b {{id: $target_id}}) \
             CREATE (a)-[r:{rel_type}]->(b) SET r = $props \
             RETURN count(r) AS created"
        ),
        WriteMode::Upsert => format!(
            "MATCH (a {{id: $source_id}}), (b {{id: $target_id}}) \
             MERGE (a)-[r:{rel_type} {{id: $id}}]->(b) SET r += $props \
             RETURN count(r) AS created"
        ),
    };

    EdgeStatement {
        rel_type,
        cypher,
        edge_id: edge.id.clone(),
        source_id: edge.source_id.clone(),
        target_id: edge.target_id.clone(),
        props,
    }
}

fn put(map: &mut BoltMap, key: &str, value: &str) {
    map.value
        .insert(BoltString::new(key), BoltType::String(BoltString::new(value)));
}

/// Parse and coerce a structured_data blob. Unparseable or non-object
/// payloads degrade to a single string property instead of failing the
/// record.
fn structured_props(raw: Option<&str>, record_id: &str) -> BoltMap {
    let Some(raw) = raw else {
        return empty_map();
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => coerce_properties(&map),
        Ok(other) => {
            warn!(record_id, "structured_data is not a JSON object; storing verbatim");
            let mut props = empty_map();
            put(&mut props, "structured_data", &other.to_string());
            props
        }
        Err(e) => {
            warn!(record_id, error = %e, "structured_data is not valid JSON; storing verbatim");
            let mut props = empty_map();
            put(&mut props, "structured_data", raw);
            props
        }
    }
}

fn empty_map() -> BoltMap {
    BoltMap {
        value: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(entity_type: &str, structured_data: Option<&str>) -> NodeRow {
        NodeRow {
            id: "n1".into(),
            name: "Alice".into(),
            entity_type: entity_type.into(),
            structured_data: structured_data.map(String::from),
            document_id: None,
            created_at: "2026-01-01 00:00:00".into(),
            updated_at: "2026-01-01 00:00:00".into(),
        }
    }

    fn edge(edge_type: &str) -> EdgeRow {
        EdgeRow {
            id: "e1".into(),
            source_id: "n1".into(),
            target_id: "n2".into(),
            edge_type: edge_type.into(),
            structured_data: None,
            document_id: None,
            created_at: "2026-01-01 00:00:00".into(),
            updated_at: "2026-01-01 00:00:00".into(),
        }
    }

    fn get_str<'a>(map: &'a BoltMap, key: &str) -> Option<&'a str> {
        match map.value.get(&BoltString::new(key)) {
            Some(BoltType::String(s)) => Some(s.value.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_node_create_uses_normalized_label() {
        let stmt = node_statement(&node("API Endpoint", None), WriteMode::Create);
        assert_eq!(stmt.label, "ApiEndpoint");
        assert_eq!(stmt.cypher, "CREATE (n:ApiEndpoint) SET n = $props");
    }

    #[test]
    fn test_node_upsert_merges_on_id() {
        let stmt = node_statement(&node("Person", None), WriteMode::Upsert);
        assert_eq!(stmt.cypher, "MERGE (n:Person {id: $id}) SET n += $props");
    }

    #[test]
    fn test_node_props_keep_original_entity_type() {
        let stmt = node_statement(&node("API Endpoint", None), WriteMode::Create);
        assert_eq!(get_str(&stmt.props, "id"), Some("n1"));
        assert_eq!(get_str(&stmt.props, "name"), Some("Alice"));
        assert_eq!(get_str(&stmt.props, "entity_type"), Some("API Endpoint"));
    }

    #[test]
    fn test_record_fields_win_over_structured_data() {
        let stmt = node_statement(
            &node("Person", Some(r#"{"id": "spoofed", "role": "admin"}"#)),
            WriteMode::Create,
        );
        assert_eq!(get_str(&stmt.props, "id"), Some("n1"));
        assert_eq!(get_str(&stmt.props, "role"), Some("admin"));
    }

    #[test]
    fn test_invalid_structured_data_degrades_to_string() {
        let stmt = node_statement(&node("Person", Some("not json {")), WriteMode::Create);
        assert_eq!(get_str(&stmt.props, "structured_data"), Some("not json {"));
        assert_eq!(get_str(&stmt.props, "name"), Some("Alice"));
    }

    #[test]
    fn test_edge_statement_observes_created_count() {
        let stmt = edge_statement(&edge("reviewed by"), WriteMode::Create);
        assert_eq!(stmt.rel_type, "REVIEWED_BY");
        assert!(stmt.cypher.contains("CREATE (a)-[r:REVIEWED_BY]->(b)"));
        assert!(stmt.cypher.ends_with("RETURN count(r) AS created"));
    }

    #[test]
    fn test_edge_upsert_merges_on_edge_id() {
        let stmt = edge_statement(&edge("uses_model"), WriteMode::Upsert);
        assert!(stmt.cypher.contains("MERGE (a)-[r:USES_MODEL {id: $id}]->(b)"));
    }

    #[test]
    fn test_no_property_values_in_cypher_text() {
        let stmt = node_statement(
            &node("Person", Some(r#"{"secret": "p@ssw0rd"}"#)),
            WriteMode::Create,
        );
        assert!(!stmt.cypher.contains("p@ssw0rd"));
        assert!(!stmt.cypher.contains("Alice"));
    }
}
