//! PostgreSQL implementation of the pool seam, backed by `sqlx`.
//!
//! Statements arrive as runtime SQL text loaded from the template registry,
//! so everything here goes through `sqlx::query` rather than the
//! compile-time macros. Rows are converted to column-name → value JSON
//! objects; mapping those into domain types is the caller's job.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::pool::{ExecutionPool, PoolConnection};
use crate::db::query::SqlValue;

/// Connection pool for the application's PostgreSQL database.
///
/// Sizing, queueing, and acquire deadlines are the pool's policy,
/// configured once here from [`DatabaseConfig`]; the facade above only
/// consumes the acquire/release contract.
#[derive(Clone, Debug)]
pub struct PgExecutionPool {
    pool: PgPool,
}

impl PgExecutionPool {
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close all connections. Called during graceful shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ExecutionPool for PgExecutionPool {
    async fn acquire(&self) -> anyhow::Result<Box<dyn PoolConnection>> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgPoolConnection { conn }))
    }
}

/// One checked-out Postgres connection. Dropping it hands the underlying
/// connection back to the sqlx pool.
struct PgPoolConnection {
    conn: sqlx::pool::PoolConnection<Postgres>,
}

#[async_trait]
impl PoolConnection for PgPoolConnection {
    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> anyhow::Result<Vec<JsonValue>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }

        let rows = query.fetch_all(&mut *self.conn).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn bind_value<'q>(query: Query<'q, Postgres, PgArguments>, value: &SqlValue) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Uuid(v) => query.bind(*v),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::Json(v) => query.bind(v.clone()),
    }
}

/// Convert one row into a column-name → value object, preserving the
/// statement's column order.
fn row_to_json(row: &PgRow) -> anyhow::Result<JsonValue> {
    let mut object = Map::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_owned(), decode_column(row, index)?);
    }
    Ok(JsonValue::Object(object))
}

fn decode_column(row: &PgRow, index: usize) -> anyhow::Result<JsonValue> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(JsonValue::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(|v| JsonValue::from(i64::from(v))),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(|v| JsonValue::from(i64::from(v))),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(JsonValue::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(|v| JsonValue::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(JsonValue::from),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => row.try_get::<Option<String>, _>(index)?.map(JsonValue::String),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|v| JsonValue::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|v| JsonValue::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| JsonValue::String(v.and_utc().to_rfc3339())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| JsonValue::String(v.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<JsonValue>, _>(index)?,
        other => anyhow::bail!("unsupported column type {other} for column {:?}", column.name()),
    };

    Ok(value.unwrap_or(JsonValue::Null))
}
