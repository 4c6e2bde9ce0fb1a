//! Service-level error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::db::errors::{DbError, QueryError, TemplateError};

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("could not find {resource} for id {id}")]
    NotFound { resource: &'static str, id: String },

    /// Database operation error. Covers template resolution failures too: a
    /// missing template key is a programmer or deployment defect, so it
    /// surfaces as an internal error, never as a client error.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A user-safe message that never leaks SQL text or driver detail.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("could not find {resource} for id {id}"),
            Error::Database(_) | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(DbError::Query(QueryError::Execution {
                rollback: Some(rollback), ..
            })) => {
                tracing::error!(rollback = %rollback, "query failed and rollback also failed: {:#}", self);
            }
            Error::Database(DbError::Template(TemplateError::NotFound { key })) => {
                tracing::error!(key = %key, "template lookup failed: {:#}", self);
            }
            Error::Database(_) | Error::Other(_) => {
                tracing::error!("internal service error: {:#}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "message": self.user_message() });
        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
