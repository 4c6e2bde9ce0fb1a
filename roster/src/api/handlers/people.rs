//! Handlers for the `/people` routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::models::PersonPayload;
use crate::db::handlers::People;
use crate::db::models::Person;
use crate::errors::{Error, Result};
use crate::AppState;

pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>> {
    let people = People::new(&state.db).find_all().await?;
    Ok(Json(people))
}

pub async fn get_person(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Person>> {
    match People::new(&state.db).find(id).await? {
        Some(person) => Ok(Json(person)),
        None => Err(Error::NotFound {
            resource: "person",
            id: id.to_string(),
        }),
    }
}

pub async fn search_people(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<Person>>> {
    let people = People::new(&state.db).find_all_by_name(&name).await?;
    Ok(Json(people))
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(payload): Json<PersonPayload>,
) -> Result<(StatusCode, Json<i32>)> {
    let id = People::new(&state.db).create(&payload.into()).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<PersonPayload>,
) -> Result<Json<Person>> {
    match People::new(&state.db).update(id, &payload.into()).await? {
        Some(person) => Ok(Json(person)),
        None => Err(Error::NotFound {
            resource: "person",
            id: id.to_string(),
        }),
    }
}

pub async fn delete_person(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    People::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
