use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub(crate) struct User {
    pub(crate) id: i32,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) phone_number: String,
    pub(crate) blocked: bool,
    pub(crate) gender: Option<String>,
    pub(crate) registration_date: DateTime<Utc>,
    pub(crate) date_of_birth: Option<NaiveDate>,
    pub(crate) location: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) profile_photo_url: Option<String>,
}

/// Writable fields of a user record. Absent fields are left untouched on update.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct UserFields {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) date_of_birth: Option<NaiveDate>,
    pub(crate) location: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) profile_photo_url: Option<String>,
}
