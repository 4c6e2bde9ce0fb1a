use serde::{Deserialize, Serialize};

use crate::db::handlers::users::UserChange;

/// Body for `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
}

impl From<UserPayload> for UserChange {
    fn from(payload: UserPayload) -> Self {
        Self {
            first_name: payload.first_name,
            last_name: payload.last_name,
            age: payload.age,
        }
    }
}
