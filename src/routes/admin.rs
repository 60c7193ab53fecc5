use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::routes::{body, id};
use crate::token::AccessClaims;
use crate::types::request::{self, PageParams, SearchParams};
use crate::types::response::{self, Page};

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, Error> {
    let admins = state.admin_controller.list(&params).await?;

    Ok(Json(Page::new(admins, &params)))
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

    let admins = state.admin_controller.search(query, &params.page).await?;

    Ok(Json(Page::new(admins, &params.page)))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.admin_controller.get(id(path)?).await?))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    payload: Result<Json<request::NewAdminData>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let admin = state.admin_controller.create(body(payload)?).await?;

    tracing::info!(admin_id = admin.id, role = %admin.role, "admin created");

    Ok((StatusCode::CREATED, Json(admin)))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<request::UpdateAdminData>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let admin = state
        .admin_controller
        .update(id(path)?, body(payload)?)
        .await?;

    Ok(Json(admin))
}

#[instrument(skip_all, fields(actor = claims.sub))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, Error> {
    let id = id(path)?;

    state.admin_controller.delete(id).await?;

    tracing::info!(admin_id = id, "admin deleted");

    Ok(Json(response::Message::new("Admin deleted successfully")))
}
