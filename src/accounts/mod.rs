//! Credential store: users, password hashes and soft deletion.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::persistence::{self, Journal};

pub mod endpoints;
pub mod password;
pub mod token;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

pub type SharedUsers = Arc<Mutex<UserStore>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Username must be at least 3 characters long.")]
    UsernameTooShort,
    #[error("Password must be at least 6 characters long.")]
    PasswordTooShort,
    #[error("Username and password are required.")]
    MissingCredentials,
    #[error("Username already exists. Please choose a different one.")]
    UsernameTaken,
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid user ID format.")]
    InvalidUserId,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UsernameTooShort
            | AccountError::PasswordTooShort
            | AccountError::MissingCredentials
            | AccountError::InvalidUserId => ApiError::Validation(e.to_string()),
            AccountError::UsernameTaken => ApiError::Conflict(e.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AccountError::UserNotFound => ApiError::NotFound(e.to_string()),
            AccountError::Hashing(_) => ApiError::Internal(e.to_string()),
        }
    }
}

/// What the API shows of a user. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub is_active: bool,
}

/// Stored form of a user; also the journal line format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            is_active: self.is_active,
        }
    }
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, AccountError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AccountError::InvalidUserId)
}

/// Returns the trimmed username to store.
pub fn validate_signup(username: &str, password: &str) -> Result<String, AccountError> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AccountError::UsernameTooShort);
    }
    validate_password(password)?;
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct UserStore {
    users: HashMap<Uuid, UserRecord>,
    // Case-sensitive; soft-deleted users keep their name.
    by_name: HashMap<String, Uuid>,
    journal: Option<Journal<UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self {
        UserStore::default()
    }

    /// Replays `users.jsonl` from `dir`; the last line for an id wins.
    pub fn open(dir: &Path) -> Result<Self, persistence::JournalError> {
        let (records, journal) = persistence::open_in::<UserRecord>(dir, "users.jsonl")?;
        let mut store = UserStore::new();
        for record in records {
            store.put(record);
        }
        log::info!(
            "loaded {} users from {}",
            store.users.len(),
            journal.path().display()
        );
        store.journal = Some(journal);
        Ok(store)
    }

    fn put(&mut self, record: UserRecord) {
        if let Some(previous) = self.users.get(&record.id) {
            if previous.username != record.username {
                self.by_name.remove(&previous.username);
            }
        }
        self.by_name.insert(record.username.clone(), record.id);
        self.users.insert(record.id, record);
    }

    fn save(&mut self, record: UserRecord) -> User {
        if let Some(journal) = &self.journal {
            journal.append(&record);
        }
        let user = record.to_user();
        self.put(record);
        user
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.by_name.contains_key(username)
    }

    pub fn get(&self, id: &Uuid) -> Option<&UserRecord> {
        self.users.get(id)
    }

    pub fn find_by_name(&self, username: &str) -> Option<&UserRecord> {
        self.by_name
            .get(username)
            .and_then(|id| self.users.get(id))
    }

    pub fn is_active(&self, id: &Uuid) -> bool {
        self.users.get(id).map(|u| u.is_active).unwrap_or(false)
    }

    pub fn insert(&mut self, username: &str, password_hash: String) -> Result<User, AccountError> {
        if self.is_taken(username) {
            return Err(AccountError::UsernameTaken);
        }
        Ok(self.save(UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            is_active: true,
            created_at: Utc::now(),
        }))
    }

    pub fn set_password_hash(&mut self, id: &Uuid, password_hash: String) -> Result<User, AccountError> {
        let mut record = self.users.get(id).cloned().ok_or(AccountError::UserNotFound)?;
        record.password_hash = password_hash;
        Ok(self.save(record))
    }

    /// Soft delete. Scores and the username stay.
    pub fn deactivate(&mut self, id: &Uuid) -> Result<User, AccountError> {
        let mut record = self.users.get(id).cloned().ok_or(AccountError::UserNotFound)?;
        record.is_active = false;
        Ok(self.save(record))
    }

    /// `(id, username)` of every active user.
    pub fn active_names(&self) -> HashMap<Uuid, String> {
        self.users
            .values()
            .filter(|u| u.is_active)
            .map(|u| (u.id, u.username.clone()))
            .collect()
    }

    pub fn close(&self) {
        if let Some(journal) = &self.journal {
            journal.close();
        }
    }
}
