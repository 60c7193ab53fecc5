use axum::http::StatusCode;
use serde::Serialize;

use crate::types::request::PageParams;

#[derive(Clone, Debug, Serialize)]
pub(crate) struct TokenPair {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Error {
    pub(crate) status: u16,
    pub(crate) message: &'static str,
}

impl Error {
    pub(crate) fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status: status.as_u16(),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub(crate) message: &'static str,
}

impl Message {
    pub(crate) fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) current_page: i64,
    pub(crate) previous_page: i64,
    pub(crate) next_page: i64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, params: &PageParams) -> Self {
        let page = params.page();

        Self {
            items,
            current_page: page,
            previous_page: (page - 1).max(1),
            next_page: page + 1,
        }
    }
}
