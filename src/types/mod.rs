pub(crate) mod admin;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod user;

pub(crate) use admin::{AdminSummary, Principal, Role};
