//! User directory for the authentication collaborator.
//!
//! The original system compared plain-text passwords against a relational
//! table; here credentials are stored as a salted SHA-256 hash, optionally
//! persisted as a JSON file in the data directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use agritrace_common::identity::{Actor, Role};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("user already exists: {0}")]
    UserExists(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("username and password must not be empty")]
    MissingFields,
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    role: Role,
    salt: String,
    password_hash: String,
}

/// Registered users, keyed by username.
pub struct UserDirectory {
    users: RwLock<BTreeMap<String, UserRecord>>,
    path: Option<PathBuf>,
}

impl UserDirectory {
    /// Directory that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Directory backed by a JSON file; loads existing users if present.
    pub fn with_storage(path: PathBuf) -> Self {
        let users = load_users(&path).unwrap_or_default();
        if !users.is_empty() {
            tracing::info!(count = users.len(), path = %path.display(), "loaded user directory");
        }
        Self {
            users: RwLock::new(users),
            path: Some(path),
        }
    }

    /// Register a new user. Fails if the username is already taken.
    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<(), AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::Unavailable("user directory lock poisoned".into()))?;
        if users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }

        let salt = fresh_salt();
        let password_hash = hash_password(&salt, password);
        users.insert(
            username.to_string(),
            UserRecord {
                username: username.to_string(),
                role,
                salt,
                password_hash,
            },
        );

        if let Some(path) = &self.path {
            if let Err(e) = save_users(path, &users) {
                tracing::warn!("failed to persist user directory: {e}");
            }
        }
        Ok(())
    }

    /// Verify credentials and return the actor identity.
    pub fn login(&self, username: &str, password: &str) -> Result<Actor, AuthError> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::Unavailable("user directory lock poisoned".into()))?;

        // Unknown user and wrong password fail identically.
        let record = users.get(username).ok_or(AuthError::InvalidCredentials)?;
        if hash_password(&record.salt, password) != record.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Actor {
            username: record.username.clone(),
            role: record.role,
        })
    }
}

fn fresh_salt() -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn load_users(path: &Path) -> Option<BTreeMap<String, UserRecord>> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

fn save_users(path: &Path, users: &BTreeMap<String, UserRecord>) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("failed to create dir: {e}"))?;
    }
    let data =
        serde_json::to_string_pretty(users).map_err(|e| format!("failed to serialize: {e}"))?;
    std::fs::write(path, data).map_err(|e| format!("failed to write: {e}"))?;
    Ok(())
}
