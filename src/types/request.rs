use serde::Deserialize;

use crate::types::Role;

const DEFAULT_PAGE_SIZE: i64 = 8;
const MAX_PAGE_SIZE: i64 = 100;
// Keeps `offset()` and the next page number far from i64 overflow.
const MAX_PAGE: i64 = 1_000_000;

#[derive(Deserialize)]
pub(crate) struct LoginData {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct LogoutData {
    pub(crate) refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct NewAdminData {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) role: Option<Role>,
}

#[derive(Deserialize)]
pub(crate) struct UpdateAdminData {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) role: Option<Role>,
}

/// Query-string pagination. Missing, unparsable and non-positive values fall back to defaults.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

impl PageParams {
    pub(crate) fn page(&self) -> i64 {
        positive(self.page.as_deref()).unwrap_or(1).min(MAX_PAGE)
    }

    pub(crate) fn page_size(&self) -> i64 {
        positive(self.page_size.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

fn positive(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SearchParams {
    pub(crate) query: Option<String>,
    #[serde(flatten)]
    pub(crate) page: PageParams,
}
