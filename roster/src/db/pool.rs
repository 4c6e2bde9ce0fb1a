//! Connection pool seam.
//!
//! The query facade never talks to a concrete driver; it goes through these
//! two traits. The production implementation wraps a `sqlx` Postgres pool
//! ([`crate::db::postgres`]), tests substitute an in-memory recording fake.
//!
//! Acquisition may suspend while the pool is exhausted; any queueing or
//! deadline policy belongs to the pool implementation, not to this layer.
//! Release is tied to dropping the connection value, so a connection
//! obtained here is returned to its pool exactly once on every exit path.

use async_trait::async_trait;

use crate::db::query::SqlValue;

/// A bounded set of reusable database connections.
#[async_trait]
pub trait ExecutionPool: Send + Sync {
    /// Check one connection out of the pool. May suspend indefinitely while
    /// the pool is exhausted.
    async fn acquire(&self) -> anyhow::Result<Box<dyn PoolConnection>>;
}

/// A single checked-out connection.
///
/// Dropping the value returns the connection to its pool.
#[async_trait]
pub trait PoolConnection: Send {
    /// Run one statement with positional parameters and return its rows as
    /// column-name → value objects. Transaction control statements
    /// (`BEGIN`, `COMMIT`, `ROLLBACK`) go through the same method with an
    /// empty parameter list.
    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> anyhow::Result<Vec<serde_json::Value>>;
}
