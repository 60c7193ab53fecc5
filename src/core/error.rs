use axum::BoxError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::types::response;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Token secrets must be non-empty")]
    MissingSecret,
    #[error("Access and refresh tokens must be signed with different secrets")]
    SharedSecret,
    #[error("Token lifetimes must be positive")]
    InvalidTtl,
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[source] Error),
}

/// Why a presented token was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unexpected signing algorithm")]
    WrongAlgorithm,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token revoked or superseded")]
    Revoked,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("No credentials provided")]
    NoCredentials,
    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),
    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(TokenError),
    #[error("Refresh token not provided")]
    MissingRefreshToken,
    #[error("Unreadable refresh token")]
    MalformedRefreshToken,
    #[error("Forbidden")]
    Forbidden,
    #[error("Credential store unavailable")]
    StoreUnavailable,
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("Admin not found")]
    AdminNotFound,
    #[error("Admin already exists")]
    AdminAlreadyExists,
    #[error("Super admin cannot be deleted")]
    SuperAdminCannotBeDeleted,
    #[error("User not found")]
    UserNotFound,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("SQL error: {0}")]
    Sql(sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("Internal server error")]
    Internal,
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => {
                tracing::error!("credential store connectivity failure: {:?}", e);
                Error::StoreUnavailable
            }
            e => Error::Sql(e),
        }
    }
}

impl Error {
    pub(crate) fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Error::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Error::NoCredentials => (
                StatusCode::UNAUTHORIZED,
                "Authorization token not provided",
            ),
            Error::Token(_) => (StatusCode::UNAUTHORIZED, "Invalid authorization token"),
            Error::InvalidRefreshToken(_) => (StatusCode::UNAUTHORIZED, "Invalid refresh token"),
            Error::MissingRefreshToken => (StatusCode::BAD_REQUEST, "Refresh token not provided"),
            Error::MalformedRefreshToken => (StatusCode::BAD_REQUEST, "Invalid refresh token"),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            Error::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            Error::InvalidRequest(message) => (StatusCode::BAD_REQUEST, *message),
            Error::AdminNotFound => (StatusCode::NOT_FOUND, "Admin not found"),
            Error::AdminAlreadyExists => (
                StatusCode::CONFLICT,
                "Admin with the same username already exists",
            ),
            Error::SuperAdminCannotBeDeleted => {
                (StatusCode::FORBIDDEN, "Super admin cannot be deleted")
            }
            Error::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            Error::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "User with the same phone number already exists",
            ),
            Error::Sql(_) | Error::Jwt(_) | Error::Bcrypt(_) | Error::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("{:?}", self);
        } else {
            tracing::warn!("{:?}", self);
        }

        (status, Json(response::Error::new(status, message))).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> impl IntoResponse {
    tracing::error!("Unhandled error: {:?}", err);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(response::Error::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        )),
    )
}
