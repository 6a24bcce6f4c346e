//! Normalization of free-form type strings into valid Cypher identifiers.
//!
//! Entity and edge types are author-defined and can contain anything
//! ("API Endpoint", "reviewed by", "ML-Model"). Labels and relationship
//! types cannot be parameterized in Cypher, so these tokens are the one
//! place the sync engine interpolates into query text; both functions
//! only ever emit alphanumerics (plus `_` for relationship types).
//!
//! Normalization is deterministic: the same input always yields the same
//! token, which is what makes MERGE-based re-sync idempotent. Distinct
//! inputs that normalize to the same token merge into one graph category;
//! that lossy mapping is accepted.

/// Label used when an entity type normalizes to nothing usable.
pub const DEFAULT_LABEL: &str = "Entity";

/// Relationship type used when an edge type normalizes to nothing usable.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATES_TO";

/// Convert a free-form entity type into a Neo4j label.
///
/// Splits on runs of non-alphanumerics, title-cases each fragment and
/// concatenates: `"API Endpoint"` becomes `ApiEndpoint`. Results that are
/// empty or do not start with a letter are prefixed with [`DEFAULT_LABEL`].
pub fn normalize_label(raw: &str) -> String {
    let mut out = String::new();
    for fragment in raw.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = fragment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(|c| c.to_lowercase()));
        }
    }

    match out.chars().next() {
        None => DEFAULT_LABEL.to_string(),
        Some(first) if !first.is_alphabetic() => format!("{DEFAULT_LABEL}{out}"),
        Some(_) => out,
    }
}

/// Convert a free-form edge type into a Neo4j relationship type.
///
/// Runs of non-alphanumerics become a single `_`, the result is
/// uppercased and leading/trailing underscores are trimmed:
/// `"reviewed by"` becomes `REVIEWED_BY`. Empty results fall back to
/// [`DEFAULT_RELATIONSHIP_TYPE`].
pub fn normalize_relationship_type(raw: &str) -> String {
    let mut out = String::new();
    let mut pending_separator = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.extend(c.to_uppercase());
        } else {
            pending_separator = true;
        }
    }

    if out.is_empty() {
        DEFAULT_RELATIONSHIP_TYPE.to_string()
    } else {
        out
    }
}
