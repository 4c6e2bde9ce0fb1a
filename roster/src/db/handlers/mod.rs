//! Repositories: one per module, each driving the query facade with the
//! module's registered templates.
//!
//! A repository borrows the [`Database`](crate::db::Database) handle,
//! resolves SQL by `"<module>.<operation>"` key, builds a
//! [`QueryUnit`](crate::db::query::QueryUnit) with positional parameters
//! (transactional where the operation is a multi-step or must-be-atomic
//! write), and maps the returned rows into [`crate::db::models`] types.
//! Row shape validation stops there; repositories never see SQL text in
//! code.

pub mod people;
pub mod users;

pub use people::People;
pub use users::Users;
