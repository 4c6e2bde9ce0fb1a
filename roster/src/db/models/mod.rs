//! Domain records returned by the repositories.
//!
//! Field names follow the wire format (camelCase); the SQL templates alias
//! database columns to match, so rows deserialize straight into these types.

pub mod people;
pub mod users;

pub use people::Person;
pub use users::User;
