//! Axum route handlers.

pub mod people;
pub mod users;
