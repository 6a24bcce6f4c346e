//! # docweave-db
//!
//! SQLite persistence layer for docweave.
//!
//! The relational store is the source of truth for extracted entities
//! (`nodes`) and relationships (`edges`). The graph sync engine in
//! `docweave-graph` only ever reads from it.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{DbError, DbPool, DbResult};
pub use migrations::run_migrations;
