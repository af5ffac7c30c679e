//! Feature flag handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

use crate::application::pagination::OffsetPage;

use super::error::ApiError;
use super::models::{DeleteResponse, ListQuery};
use super::state::ApiState;

pub async fn create_flag(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let flag = state.flags.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(flag)))
}

pub async fn list_flags(
    State(state): State<ApiState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = OffsetPage::new(query.skip, query.limit)?;
    let flags = state.flags.list(page).await?;
    Ok(Json(flags))
}

pub async fn get_flag(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let flag = state.flags.get_by_code(&code).await?;
    Ok(Json(flag))
}

pub async fn update_flag(
    State(state): State<ApiState>,
    Path(code): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let flag = state.flags.update(&code, &payload).await?;
    Ok(Json(flag))
}

pub async fn delete_flag(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.flags.delete(&code).await?;
    Ok(Json(DeleteResponse::deleted()))
}

pub async fn enable_flag(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let flag = state.flags.enable(&code).await?;
    Ok(Json(flag))
}

pub async fn disable_flag(
    State(state): State<ApiState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let flag = state.flags.disable(&code).await?;
    Ok(Json(flag))
}
