//! Database query implementations.

pub mod edges;
pub mod nodes;
