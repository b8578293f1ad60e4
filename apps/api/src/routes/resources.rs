//! Generic CRUD handlers, instantiated once per entity in `build_router`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::routes::pagination::{PageParams, Paginated};
use crate::serializers::{merge_partial, Resource};
use crate::state::AppState;
use crate::store::Stored;

fn not_found<E: Resource>(id: i64) -> AppError {
    AppError::NotFound(format!("No {} matches id {id}", E::NAME))
}

async fn fetch<E: Stored>(state: &AppState, id: i64) -> Result<E, AppError> {
    E::repository(&state.repos)
        .get(id)
        .await?
        .ok_or_else(|| not_found::<E>(id))
}

/// GET /{collection}/
pub async fn list<E: Stored>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let repo = E::repository(&state.repos);

    match params.page(state.config.max_page_size)? {
        None => {
            let records = repo.list(None).await?;
            Ok(Json(Value::Array(records.iter().map(E::encode).collect())))
        }
        Some(page) => {
            let count = repo.count().await?;
            let records = repo.list(Some(page)).await?;
            let results = records.iter().map(E::encode).collect();
            Ok(Json(json!(Paginated::new(uri.path(), page, count, results))))
        }
    }
}

/// POST /{collection}/
pub async fn create<E: Stored>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = body?;
    let draft = E::decode(&body)?;
    let record = E::repository(&state.repos).create(draft).await?;
    info!("Created {} {}", E::NAME, record.id());
    Ok((StatusCode::CREATED, Json(record.encode())))
}

/// GET /{collection}/:id/
pub async fn retrieve<E: Stored>(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let record = fetch::<E>(&state, id).await?;
    Ok(Json(record.encode()))
}

/// PUT /{collection}/:id/ — every writable field must be supplied.
pub async fn update<E: Stored>(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    fetch::<E>(&state, id).await?;
    let Json(body) = body?;
    let draft = E::decode(&body)?;
    save::<E>(&state, id, draft).await
}

/// PATCH /{collection}/:id/ — omitted fields keep their stored values.
pub async fn partial_update<E: Stored>(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let existing = fetch::<E>(&state, id).await?;
    let Json(body) = body?;
    let merged = merge_partial(&existing, &body)?;
    let draft = E::decode(&merged)?;
    save::<E>(&state, id, draft).await
}

async fn save<E: Stored>(state: &AppState, id: i64, draft: E::Draft) -> Result<Json<Value>, AppError> {
    let record = E::repository(&state.repos)
        .update(id, draft)
        .await?
        .ok_or_else(|| not_found::<E>(id))?;
    info!("Updated {} {id}", E::NAME);
    Ok(Json(record.encode()))
}

/// DELETE /{collection}/:id/
pub async fn destroy<E: Stored>(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    if !E::repository(&state.repos).delete(id).await? {
        return Err(not_found::<E>(id));
    }
    info!("Deleted {} {id}", E::NAME);
    Ok(StatusCode::NO_CONTENT)
}
