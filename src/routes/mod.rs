use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path};

use crate::core::error::Error;

pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod router;
pub(crate) mod user;

pub(crate) fn id(path: Result<Path<i32>, PathRejection>) -> Result<i32, Error> {
    path.map(|Path(id)| id)
        .map_err(|_| Error::InvalidRequest("Invalid ID"))
}

pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(data)| data)
        .map_err(|_| Error::InvalidRequest("Invalid request format"))
}
