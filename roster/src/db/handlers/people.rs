//! Repository for the `people` module.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::Person;
use crate::db::query::SqlValue;
use crate::db::Database;

/// Fields accepted when creating or replacing a person.
#[derive(Debug, Clone)]
pub struct PersonChange {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
}

/// Shape of a `RETURNING id` row.
#[derive(Debug, Deserialize)]
struct NewId {
    id: i32,
}

pub struct People<'a> {
    db: &'a Database,
}

impl<'a> People<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Fetch a single person by id. `None` when no row matches.
    #[instrument(skip(self), err)]
    pub async fn find(&self, id: i32) -> Result<Option<Person>> {
        let sql = self.db.template("people.findById")?;
        let rows = self
            .db
            .unit()
            .with_template(sql, vec![SqlValue::from(id)])
            .execute()
            .await?;

        rows.into_iter().next().map(decode).transpose()
    }

    /// Fetch every person, ordered by id.
    #[instrument(skip(self), err)]
    pub async fn find_all(&self) -> Result<Vec<Person>> {
        let sql = self.db.template("people.findAll")?;
        let rows = self.db.unit().with_template(sql, vec![]).execute().await?;

        rows.into_iter().map(decode).collect()
    }

    /// Fetch every person whose first or last name contains `name`.
    #[instrument(skip(self), err)]
    pub async fn find_all_by_name(&self, name: &str) -> Result<Vec<Person>> {
        let sql = self.db.template("people.findAllByName")?;
        let rows = self
            .db
            .unit()
            .with_template(sql, vec![SqlValue::from(format!("%{name}%"))])
            .execute()
            .await?;

        rows.into_iter().map(decode).collect()
    }

    /// Insert a new person and return the generated id.
    #[instrument(skip(self, change), fields(first_name = %change.first_name), err)]
    pub async fn create(&self, change: &PersonChange) -> Result<i32> {
        let sql = self.db.template("people.create")?;
        let rows = self
            .db
            .unit()
            .transactional()
            .with_template(
                sql,
                vec![
                    change.first_name.as_str().into(),
                    change.last_name.as_str().into(),
                    change.age.into(),
                ],
            )
            .execute()
            .await?;

        let row = rows.into_iter().next().ok_or(DbError::EmptyReturn { entity: "person" })?;
        let new_id: NewId = serde_json::from_value(row).map_err(|source| DbError::Decode {
            entity: "person",
            source,
        })?;
        Ok(new_id.id)
    }

    /// Replace a person's fields and return the updated record. `None` when
    /// no row matches the id.
    #[instrument(skip(self, change), err)]
    pub async fn update(&self, id: i32, change: &PersonChange) -> Result<Option<Person>> {
        let sql = self.db.template("people.update")?;
        let rows = self
            .db
            .unit()
            .transactional()
            .with_template(
                sql,
                vec![
                    id.into(),
                    change.first_name.as_str().into(),
                    change.last_name.as_str().into(),
                    change.age.into(),
                ],
            )
            .execute()
            .await?;

        rows.into_iter().next().map(decode).transpose()
    }

    /// Delete a person by id.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i32) -> Result<()> {
        let sql = self.db.template("people.delete")?;
        self.db
            .unit()
            .with_template(sql, vec![SqlValue::from(id)])
            .execute()
            .await?;
        Ok(())
    }
}

fn decode(row: JsonValue) -> Result<Person> {
    serde_json::from_value(row).map_err(|source| DbError::Decode {
        entity: "person",
        source,
    })
}
