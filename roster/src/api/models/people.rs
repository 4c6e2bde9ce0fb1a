use serde::{Deserialize, Serialize};

use crate::db::handlers::people::PersonChange;

/// Body for `POST /people` and `PUT /people/{id}`.
///
/// Unknown fields (such as an `id` echoed back on PUT) are ignored; the
/// path parameter is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPayload {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
}

impl From<PersonPayload> for PersonChange {
    fn from(payload: PersonPayload) -> Self {
        Self {
            first_name: payload.first_name,
            last_name: payload.last_name,
            age: payload.age,
        }
    }
}
