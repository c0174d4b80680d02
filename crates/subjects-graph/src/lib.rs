//! # Subjects Graph
//!
//! Neo4j reconciliation for Subject taxonomy concepts.
//!
//! Turns a desired Subject state into an ordered batch of idempotent graph
//! statements, runs it atomically through a [`GraphStore`], and interprets the
//! results for callers.

pub mod client;
pub mod error;
pub mod queries;
pub mod schema;
pub mod service;
pub mod statement;
pub mod store;

pub use client::{GraphClient, GraphConfig};
pub use error::{GraphError, GraphResult};
pub use schema::{UniqueConstraint, SUBJECT_CONSTRAINTS};
pub use service::{ServiceConfig, SubjectService};
pub use statement::{Statement, StatementResult};
pub use store::{GraphStore, MemoryStore, Neo4jStore};
