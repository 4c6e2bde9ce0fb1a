//! Request payloads for the management API.

pub mod people;
pub mod users;

pub use people::PersonPayload;
pub use users::UserPayload;
