//! Repository for the `users` module.
//!
//! Single-statement writes here are already atomic, so unlike
//! [`People`](crate::db::handlers::People) none of these operations opt
//! into explicit transaction wrapping.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::User;
use crate::db::query::SqlValue;
use crate::db::Database;

/// Fields accepted when creating or replacing a user.
#[derive(Debug, Clone)]
pub struct UserChange {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
}

#[derive(Debug, Deserialize)]
struct NewId {
    id: i32,
}

pub struct Users<'a> {
    db: &'a Database,
}

impl<'a> Users<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn find(&self, id: i32) -> Result<Option<User>> {
        let sql = self.db.template("users.findById")?;
        let rows = self
            .db
            .unit()
            .with_template(sql, vec![SqlValue::from(id)])
            .execute()
            .await?;

        rows.into_iter().next().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn find_all(&self) -> Result<Vec<User>> {
        let sql = self.db.template("users.findAll")?;
        let rows = self.db.unit().with_template(sql, vec![]).execute().await?;

        rows.into_iter().map(decode).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn find_all_by_name(&self, name: &str) -> Result<Vec<User>> {
        let sql = self.db.template("users.findUsersByName")?;
        let rows = self
            .db
            .unit()
            .with_template(sql, vec![SqlValue::from(format!("%{name}%"))])
            .execute()
            .await?;

        rows.into_iter().map(decode).collect()
    }

    #[instrument(skip(self, change), fields(first_name = %change.first_name), err)]
    pub async fn create(&self, change: &UserChange) -> Result<i32> {
        let sql = self.db.template("users.create")?;
        let rows = self
            .db
            .unit()
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

        let row = rows.into_iter().next().ok_or(DbError::EmptyReturn { entity: "user" })?;
        let new_id: NewId = serde_json::from_value(row).map_err(|source| DbError::Decode {
            entity: "user",
            source,
        })?;
        Ok(new_id.id)
    }

    /// Replace a user's fields. The `users.update` template binds the id
    /// last (`$4`), after the field values.
    #[instrument(skip(self, change), err)]
    pub async fn update(&self, id: i32, change: &UserChange) -> Result<Option<User>> {
        let sql = self.db.template("users.update")?;
        let rows = self
            .db
            .unit()
            .with_template(
                sql,
                vec![
                    change.first_name.as_str().into(),
                    change.last_name.as_str().into(),
                    change.age.into(),
                    id.into(),
                ],
            )
            .execute()
            .await?;

        rows.into_iter().next().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i32) -> Result<()> {
        let sql = self.db.template("users.delete")?;
        self.db
            .unit()
            .with_template(sql, vec![SqlValue::from(id)])
            .execute()
            .await?;
        Ok(())
    }
}

fn decode(row: JsonValue) -> Result<User> {
    serde_json::from_value(row).map_err(|source| DbError::Decode {
        entity: "user",
        source,
    })
}
