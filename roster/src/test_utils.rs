//! Shared test helpers: an in-memory implementation of the pool seam that
//! records every acquisition, release, and statement, with scriptable
//! results and failures.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::db::pool::{ExecutionPool, PoolConnection};
use crate::db::query::{SqlValue, BEGIN, COMMIT, ROLLBACK};
use crate::db::templates::TemplateRegistry;
use crate::db::Database;

/// One statement as seen by a fake connection.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Default)]
struct FakeState {
    acquired: usize,
    released: usize,
    statements: Vec<Statement>,
    /// Scripted outcomes for non-transaction-control statements, consumed
    /// in order. An exhausted queue answers with an empty row set.
    results: VecDeque<Result<Vec<JsonValue>, String>>,
    acquire_error: Option<String>,
    rollback_error: Option<String>,
}

/// Recording fake for [`ExecutionPool`]. Clones share state.
#[derive(Clone, Default)]
pub struct FakePool {
    state: Arc<Mutex<FakeState>>,
}

impl FakePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next statement to succeed with `rows`.
    pub fn push_rows(&self, rows: Vec<JsonValue>) {
        self.state.lock().unwrap().results.push_back(Ok(rows));
    }

    /// Script the next statement to fail with `message`.
    pub fn push_error(&self, message: &str) {
        self.state.lock().unwrap().results.push_back(Err(message.to_owned()));
    }

    /// Make every acquisition fail with `message`.
    pub fn fail_acquire(&self, message: &str) {
        self.state.lock().unwrap().acquire_error = Some(message.to_owned());
    }

    /// Make every `ROLLBACK` fail with `message`.
    pub fn fail_rollback(&self, message: &str) {
        self.state.lock().unwrap().rollback_error = Some(message.to_owned());
    }

    /// Every statement issued so far, in order, transaction control included.
    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().unwrap().statements.clone()
    }

    /// Just the SQL text of every statement issued so far.
    pub fn sql_log(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }
}

#[async_trait]
impl ExecutionPool for FakePool {
    async fn acquire(&self) -> anyhow::Result<Box<dyn PoolConnection>> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.acquire_error {
            anyhow::bail!("{message}");
        }
        state.acquired += 1;
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl PoolConnection for FakeConnection {
    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> anyhow::Result<Vec<JsonValue>> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(Statement {
            sql: sql.to_owned(),
            params: params.to_vec(),
        });

        match sql {
            BEGIN | COMMIT => Ok(vec![]),
            ROLLBACK => match &state.rollback_error {
                Some(message) => anyhow::bail!("{message}"),
                None => Ok(vec![]),
            },
            _ => match state.results.pop_front() {
                Some(Ok(rows)) => Ok(rows),
                Some(Err(message)) => anyhow::bail!("{message}"),
                None => Ok(vec![]),
            },
        }
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.state.lock().unwrap().released += 1;
    }
}

/// Database handle over the fake pool and the shipped template files.
pub fn directory_database(pool: &FakePool) -> Database {
    let templates = TemplateRegistry::load(concat!(env!("CARGO_MANIFEST_DIR"), "/sql"))
        .expect("shipped template files must load");
    Database::new(Arc::new(pool.clone()), templates)
}

/// Database handle over the fake pool and an inline template set.
pub fn database_with_templates<I, K, V>(pool: &FakePool, entries: I) -> Database
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let templates = TemplateRegistry::from_entries(entries).expect("inline templates must be valid");
    Database::new(Arc::new(pool.clone()), templates)
}
