//! Database layer: SQL template registry, query execution facade, and
//! repositories.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - resolve template keys, map rows)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐     ┌──────────────────┐
//! │  QueryUnit  │ ←── │ TemplateRegistry │  (module.operation → SQL text)
//! └──────┬──────┘     └──────────────────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │  (via the ExecutionPool seam)
//! └─────────────┘
//! ```
//!
//! No SQL text is written in application code: repositories look up a
//! template by `"<module>.<operation>"` key and drive a [`query::QueryUnit`]
//! with positional parameters and an optional transaction flag.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod pool;
pub mod postgres;
pub mod query;
pub mod templates;

use std::sync::Arc;

use crate::db::errors::TemplateError;
use crate::db::pool::ExecutionPool;
use crate::db::query::QueryUnit;
use crate::db::templates::TemplateRegistry;

/// Handle bundling the connection pool and the template registry.
///
/// Cheap to clone; both halves are shared. The registry is immutable after
/// startup and the pool seam carries its own interior synchronization, so
/// no locking is added here.
#[derive(Clone)]
pub struct Database {
    pool: Arc<dyn ExecutionPool>,
    templates: Arc<TemplateRegistry>,
}

impl Database {
    pub fn new(pool: Arc<dyn ExecutionPool>, templates: TemplateRegistry) -> Self {
        Self {
            pool,
            templates: Arc::new(templates),
        }
    }

    /// Resolve the SQL text for a template key.
    pub fn template(&self, key: &str) -> Result<&str, TemplateError> {
        self.templates.get(key)
    }

    /// Start a fresh query unit against this database's pool.
    pub fn unit(&self) -> QueryUnit<'_> {
        QueryUnit::new(self.pool.as_ref())
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }
}
