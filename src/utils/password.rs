//! bcrypt hashing, run on the blocking pool so slow hashes never stall request tasks.

use crate::core::error::Error;

pub(crate) const MIN_PASSWORD_LENGTH: usize = 8;

pub(crate) async fn hash(password: &str, cost: u32) -> Result<String, Error> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|_| Error::Internal)?
        .map_err(Error::Bcrypt)
}

/// Constant-time comparison against a salted bcrypt hash.
pub(crate) async fn verify(password: &str, hash: &str) -> Result<bool, Error> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|_| Error::Internal)?
        .map_err(Error::Bcrypt)
}
