//! Transactional query execution facade.
//!
//! A [`QueryUnit`] binds one SQL template, its positional parameters, and an
//! optional transaction flag to a single execution. `execute` consumes the
//! unit, so an instance can never be shared across concurrent executions or
//! reused with stale state; one unit per logical query is enforced by the
//! type system rather than by a reset step.
//!
//! The unit owns a pooled connection only for the duration of `execute`.
//! The connection is a droppable value obtained through the
//! [`ExecutionPool`] seam, so it is returned to the pool exactly once on
//! every exit path, including every failure path.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::db::errors::QueryError;
use crate::db::pool::{ExecutionPool, PoolConnection};

/// Transaction control statements.
pub const BEGIN: &str = "BEGIN";
pub const COMMIT: &str = "COMMIT";
pub const ROLLBACK: &str = "ROLLBACK";

/// A dynamically typed bind parameter, positionally matched to a `$n`
/// placeholder in the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One unit of work against the database.
///
/// Success returns the statement's rows as ordered column-name → value
/// objects; a query matching zero rows returns an empty vector, which is a
/// valid outcome and never upgraded to an error.
#[must_use = "a query unit does nothing until executed"]
pub struct QueryUnit<'a> {
    pool: &'a dyn ExecutionPool,
    sql: String,
    params: Vec<SqlValue>,
    transactional: bool,
}

impl<'a> QueryUnit<'a> {
    pub fn new(pool: &'a dyn ExecutionPool) -> Self {
        Self {
            pool,
            sql: String::new(),
            params: Vec::new(),
            transactional: false,
        }
    }

    /// Set the SQL text and the ordered parameter list, replacing any prior
    /// configuration.
    pub fn with_template(mut self, sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        self.sql = sql.into();
        self.params = params;
        self
    }

    /// Wrap the statement in `BEGIN`/`COMMIT` (with `ROLLBACK` on failure).
    /// Idempotent.
    pub fn transactional(mut self) -> Self {
        self.transactional = true;
        self
    }

    /// Execute the configured statement.
    ///
    /// Fails with [`QueryError::InvalidState`] before contacting the pool
    /// when no SQL text is configured. Otherwise acquires one connection
    /// (which may suspend while the pool is exhausted), runs the statement,
    /// and for a transactional unit commits on success or rolls back on
    /// failure. The original failure always propagates as the primary
    /// error; a failed rollback is attached as secondary context. The
    /// connection is released when it drops, on every path.
    pub async fn execute(self) -> Result<Vec<JsonValue>, QueryError> {
        if self.sql.is_empty() {
            return Err(QueryError::InvalidState);
        }

        let mut conn = self.pool.acquire().await.map_err(QueryError::Acquire)?;
        let result = Self::run_on(conn.as_mut(), &self.sql, &self.params, self.transactional).await;
        drop(conn);
        result
    }

    async fn run_on(
        conn: &mut dyn PoolConnection,
        sql: &str,
        params: &[SqlValue],
        transactional: bool,
    ) -> Result<Vec<JsonValue>, QueryError> {
        let outcome = async {
            if transactional {
                conn.run(BEGIN, &[]).await?;
            }
            let rows = conn.run(sql, params).await?;
            if transactional {
                conn.run(COMMIT, &[]).await?;
            }
            Ok::<_, anyhow::Error>(rows)
        }
        .await;

        match outcome {
            Ok(rows) => Ok(rows),
            Err(source) => {
                let rollback = if transactional {
                    conn.run(ROLLBACK, &[]).await.err()
                } else {
                    None
                };
                if let Some(rollback_err) = &rollback {
                    warn!(error = %rollback_err, "rollback failed after statement error");
                }
                Err(QueryError::Execution { source, rollback })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakePool;
    use serde_json::json;

    const FIND_BY_ID: &str = "SELECT id, first_name, last_name, age FROM people WHERE id = $1";

    #[tokio::test]
    async fn scenario_a_single_statement_single_acquire() {
        let pool = FakePool::new();
        pool.push_rows(vec![json!({"id": 42, "first_name": "Ada"})]);

        let rows = QueryUnit::new(&pool)
            .with_template(FIND_BY_ID, vec![SqlValue::from(42)])
            .execute()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let statements = pool.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, FIND_BY_ID);
        assert_eq!(statements[0].params, vec![SqlValue::Int(42)]);
        assert_eq!(pool.acquired(), 1);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn zero_matching_rows_is_a_valid_outcome() {
        let pool = FakePool::new();
        pool.push_rows(vec![]);

        let rows = QueryUnit::new(&pool)
            .with_template(FIND_BY_ID, vec![SqlValue::from(7)])
            .execute()
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn scenario_c_empty_sql_fails_before_the_pool() {
        let pool = FakePool::new();

        let err = QueryUnit::new(&pool)
            .with_template("", vec![])
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidState));
        assert_eq!(pool.acquired(), 0);
        assert_eq!(pool.released(), 0);
        assert!(pool.statements().is_empty());
    }

    #[tokio::test]
    async fn transactional_success_is_begin_statement_commit() {
        let pool = FakePool::new();
        pool.push_rows(vec![json!({"id": 1})]);

        QueryUnit::new(&pool)
            .with_template("INSERT INTO people (first_name) VALUES ($1) RETURNING id", vec!["Ada".into()])
            .transactional()
            .execute()
            .await
            .unwrap();

        assert_eq!(pool.sql_log(), vec![BEGIN, "INSERT INTO people (first_name) VALUES ($1) RETURNING id", COMMIT]);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn scenario_b_failing_statement_rolls_back_and_propagates_the_original() {
        let pool = FakePool::new();
        pool.push_error("duplicate key value violates unique constraint");

        let err = QueryUnit::new(&pool)
            .with_template("UPDATE people SET first_name = $1", vec!["Ada".into()])
            .transactional()
            .execute()
            .await
            .unwrap_err();

        assert_eq!(pool.sql_log(), vec![BEGIN, "UPDATE people SET first_name = $1", ROLLBACK]);
        match err {
            QueryError::Execution { source, rollback } => {
                assert!(source.to_string().contains("unique constraint"));
                assert!(rollback.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(pool.acquired(), 1);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn failed_rollback_is_attached_never_replacing_the_original() {
        let pool = FakePool::new();
        pool.push_error("division by zero");
        pool.fail_rollback("connection reset");

        let err = QueryUnit::new(&pool)
            .with_template("SELECT 1/0", vec![])
            .transactional()
            .execute()
            .await
            .unwrap_err();

        match err {
            QueryError::Execution { source, rollback } => {
                assert!(source.to_string().contains("division by zero"));
                let rollback = rollback.expect("rollback failure should be attached");
                assert!(rollback.to_string().contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn non_transactional_never_issues_transaction_control() {
        let pool = FakePool::new();
        pool.push_error("syntax error");

        let err = QueryUnit::new(&pool)
            .with_template("SELEC 1", vec![])
            .execute()
            .await
            .unwrap_err();

        assert_eq!(pool.sql_log(), vec!["SELEC 1"]);
        assert!(matches!(err, QueryError::Execution { rollback: None, .. }));
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn acquisition_failure_propagates_without_leaking() {
        let pool = FakePool::new();
        pool.fail_acquire("pool exhausted");

        let err = QueryUnit::new(&pool)
            .with_template("SELECT 1", vec![])
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Acquire(_)));
        assert_eq!(pool.acquired(), 0);
        assert_eq!(pool.released(), 0);
    }

    #[tokio::test]
    async fn acquisitions_equal_releases_across_mixed_outcomes() {
        let pool = FakePool::new();
        pool.push_rows(vec![json!({"id": 1})]);
        pool.push_error("constraint violation");
        pool.push_rows(vec![]);

        let _ = QueryUnit::new(&pool)
            .with_template("SELECT 1", vec![])
            .execute()
            .await;
        let _ = QueryUnit::new(&pool)
            .with_template("UPDATE people SET age = $1", vec![SqlValue::from(30)])
            .transactional()
            .execute()
            .await;
        let _ = QueryUnit::new(&pool)
            .with_template("SELECT 2", vec![])
            .execute()
            .await;

        assert_eq!(pool.acquired(), 3);
        assert_eq!(pool.released(), 3);
    }

    #[tokio::test]
    async fn with_template_replaces_prior_configuration() {
        let pool = FakePool::new();
        pool.push_rows(vec![]);

        QueryUnit::new(&pool)
            .with_template("SELECT 1", vec![SqlValue::from(1)])
            .with_template("SELECT 2", vec![SqlValue::from(2)])
            .execute()
            .await
            .unwrap();

        let statements = pool.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "SELECT 2");
        assert_eq!(statements[0].params, vec![SqlValue::Int(2)]);
    }

    #[tokio::test]
    async fn transactional_is_idempotent() {
        let pool = FakePool::new();
        pool.push_rows(vec![]);

        QueryUnit::new(&pool)
            .with_template("SELECT 1", vec![])
            .transactional()
            .transactional()
            .execute()
            .await
            .unwrap();

        assert_eq!(pool.sql_log(), vec![BEGIN, "SELECT 1", COMMIT]);
    }
}
