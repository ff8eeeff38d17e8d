//! bcrypt on the blocking pool; a hash at cost 12 takes long enough to stall a worker.

use rocket::tokio::task;

use super::AccountError;

pub async fn hash(password: String, cost: u32) -> Result<String, AccountError> {
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

/// A stored hash that bcrypt cannot read counts as a mismatch.
pub async fn verify(password: String, hash: String) -> Result<bool, AccountError> {
    let outcome = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?;
    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            log::warn!("unreadable password hash: {e}");
            Ok(false)
        }
    }
}
