//! Handlers for the `/users` routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::models::UserPayload;
use crate::db::handlers::Users;
use crate::db::models::User;
use crate::errors::{Error, Result};
use crate::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = Users::new(&state.db).find_all().await?;
    Ok(Json(users))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<User>> {
    match Users::new(&state.db).find(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(Error::NotFound {
            resource: "user",
            id: id.to_string(),
        }),
    }
}

pub async fn search_users(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<User>>> {
    let users = Users::new(&state.db).find_all_by_name(&name).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> Result<(StatusCode, Json<i32>)> {
    let id = Users::new(&state.db).create(&payload.into()).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<User>> {
    match Users::new(&state.db).update(id, &payload.into()).await? {
        Some(user) => Ok(Json(user)),
        None => Err(Error::NotFound {
            resource: "user",
            id: id.to_string(),
        }),
    }
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    Users::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
