//! Store gateways: where statement batches are executed.

pub mod memory;
pub mod neo4j;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GraphResult;
use crate::schema::UniqueConstraint;
use crate::statement::{Statement, StatementResult};

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// Backing graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute `batch` as one all-or-nothing unit, returning one result per
    /// statement in order. On error nothing from the batch is committed.
    async fn run_batch(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>>;

    async fn ensure_constraints(&self, constraints: &[UniqueConstraint]) -> GraphResult<()>;

    /// Liveness probe.
    async fn check(&self) -> GraphResult<()>;

    /// Human readable location of the store, for health output.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    async fn run_batch(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>> {
        (**self).run_batch(batch).await
    }

    async fn ensure_constraints(&self, constraints: &[UniqueConstraint]) -> GraphResult<()> {
        (**self).ensure_constraints(constraints).await
    }

    async fn check(&self) -> GraphResult<()> {
        (**self).check().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
