//! Error types for the database layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or querying the SQL template registry.
///
/// Every variant except [`TemplateError::NotFound`] is a startup-time
/// configuration defect and aborts the process before it begins serving.
/// `NotFound` is raised at call time for a key no template file defines;
/// it signals a programmer error (typo, missing file), never bad user
/// input, and maps to an internal error at the HTTP boundary.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A template file (or the template directory itself) could not be read
    #[error("failed to read template file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file is not valid YAML or does not match the expected shape
    #[error("malformed template file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The module declared inside a template file does not match its file name.
    /// The namespace is always derived from the file name, so a mismatch means
    /// the file would register under a name nobody expects.
    #[error("template file {path} must define exactly the module {expected:?} (found {found:?})")]
    ModuleMismatch {
        path: PathBuf,
        expected: String,
        found: Vec<String>,
    },

    /// A key has an empty module or operation segment
    #[error("template key {key:?} has an empty module or operation segment")]
    EmptySegment { key: String },

    /// Two definitions for the same `module.operation` key. A second
    /// definition is a configuration defect, never a silent override.
    #[error("duplicate template key {key:?} (redefined by {path})")]
    Duplicate { key: String, path: PathBuf },

    /// The requested key is absent from the registry
    #[error("no SQL template registered for key {key:?}")]
    NotFound { key: String },
}

/// Errors raised by a [`QueryUnit`](crate::db::query::QueryUnit) execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// `execute` was invoked with no SQL text configured. Raised before the
    /// pool or the database is contacted.
    #[error("query unit has no SQL text configured")]
    InvalidState,

    /// The pool could not supply a connection (exhausted, closed, timed
    /// out). Transient in nature; callers may retry, this layer never does.
    #[error("failed to acquire a database connection")]
    Acquire(#[source] anyhow::Error),

    /// The database rejected or failed the statement (or `BEGIN`/`COMMIT`).
    ///
    /// `source` is always the original failure. If the unit was
    /// transactional, a rollback was attempted before this error
    /// propagated; a failure of that rollback is carried in `rollback` as
    /// secondary context and never replaces the original cause.
    #[error("statement execution failed")]
    Execution {
        #[source]
        source: anyhow::Error,
        rollback: Option<anyhow::Error>,
    },
}

/// Unified error type for repository operations.
#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// A row came back in a shape the domain model cannot absorb
    #[error("failed to decode a {entity} row")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A statement with a `RETURNING` clause produced no row
    #[error("expected {entity} row was not returned")]
    EmptyReturn { entity: &'static str },
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
