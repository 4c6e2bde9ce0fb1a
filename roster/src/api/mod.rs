//! HTTP layer: request handlers and wire-format models.
//!
//! - [`handlers`]: axum route handlers for the people and users modules
//! - [`models`]: request payloads accepted by those handlers
//!
//! Handlers validate nothing about row shape; they hand parameters to the
//! repositories and serialize whatever comes back.

pub mod handlers;
pub mod models;
