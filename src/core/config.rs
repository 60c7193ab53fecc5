use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) database_host: String,
    pub(crate) database_port: u16,
    pub(crate) database_name: String,
    pub(crate) database_user: String,
    pub(crate) database_password: String,
    #[serde(default = "default_max_connections")]
    pub(crate) database_max_connections: u32,
    #[serde(default = "default_log_level")]
    pub(crate) log_level: String,
    pub(crate) port: u16,
    pub(crate) access_secret: String,
    pub(crate) refresh_secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub(crate) access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub(crate) refresh_ttl_days: i64,
    #[serde(default = "default_store_timeout_ms")]
    pub(crate) store_timeout_ms: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub(crate) bcrypt_cost: u32,
    #[serde(default = "default_rate_limit")]
    pub(crate) rate_limit_per_second: u64,
    pub(crate) bootstrap_username: Option<String>,
    pub(crate) bootstrap_password: Option<String>,
}

impl Args {
    pub(crate) fn database_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.database_user,
            self.database_password,
            self.database_host,
            self.database_port,
            self.database_name
        )
    }

    pub(crate) fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_ttl_minutes)
    }

    pub(crate) fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_ttl_days)
    }

    pub(crate) fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".into()
}

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_rate_limit() -> u64 {
    50
}
