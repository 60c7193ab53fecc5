use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::routes::{body, id};
use crate::token::AccessClaims;
use crate::types::request::{PageParams, SearchParams};
use crate::types::response::{self, Page};
use crate::types::user::UserFields;

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, Error> {
    let users = state.user_controller.list(&params).await?;

    Ok(Json(Page::new(users, &params)))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn search(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, Error> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .ok_or(Error::InvalidRequest("Search query is required"))?;

    let users = state.user_controller.search(query, &params.page).await?;

    Ok(Json(Page::new(users, &params.page)))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.user_controller.get(id(path)?).await?))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    payload: Result<Json<UserFields>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let user = state.user_controller.create(body(payload)?).await?;

    tracing::info!(user_id = user.id, "user created");

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UserFields>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let user = state
        .user_controller
        .update(id(path)?, body(payload)?)
        .await?;

    Ok(Json(user))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let id = id(path)?;

    state.user_controller.delete(id).await?;

    tracing::info!(user_id = id, "user deleted");

    Ok(Json(response::Message::new("User deleted successfully")))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn block(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.user_controller.set_blocked(id(path)?, true).await?))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn unblock(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.user_controller.set_blocked(id(path)?, false).await?))
}
