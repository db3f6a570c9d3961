//! Durable session persistence.
//!
//! Two values live under the data directory, mirroring the browser client's
//! local storage keys: `token` holds the raw credential string and
//! `user.json` the serialized identity. Both are written on login, read on
//! startup, and removed on logout or forced teardown. A half-present or
//! unreadable pair is treated as no session and cleaned up.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::model::User;

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user.json";

pub struct SessionStorage {
    dir: PathBuf,
}

impl SessionStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join(USER_FILE)
    }

    /// Read the persisted session. Returns `None` and clears any leftover
    /// half of the pair when either value is missing or unparsable.
    pub fn load(&self) -> Option<(String, User)> {
        let token = fs::read_to_string(self.token_path()).ok();
        let user_raw = fs::read_to_string(self.user_path()).ok();

        match (token, user_raw) {
            (Some(token), Some(user_raw)) if !token.trim().is_empty() => {
                match serde_json::from_str::<User>(&user_raw) {
                    Ok(user) => Some((token.trim().to_string(), user)),
                    Err(err) => {
                        tracing::warn!(error = %err, "persisted user is unreadable, discarding session");
                        self.clear();
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                tracing::warn!("persisted session is incomplete, discarding");
                self.clear();
                None
            }
        }
    }

    /// Persist the pair. On any failure nothing half-written survives.
    pub fn save(&self, token: &str, user: &User) -> Result<()> {
        let result = (|| -> Result<()> {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("failed to create data dir {}", self.dir.display()))?;
            let user_json = serde_json::to_string(user).context("failed to serialize user")?;
            fs::write(self.user_path(), user_json).context("failed to write user")?;
            fs::write(self.token_path(), token).context("failed to write token")?;
            Ok(())
        })();

        if result.is_err() {
            self.clear();
        }
        result
    }

    /// Remove both values. Idempotent; missing files are not an error.
    pub fn clear(&self) {
        let _ = fs::remove_file(self.token_path());
        let _ = fs::remove_file(self.user_path());
    }

    pub fn is_empty(&self) -> bool {
        !self.token_path().exists() && !self.user_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use tempfile::TempDir;

    fn user() -> User {
        User {
            id: "1".into(),
            email: "ana@exemplo.com".into(),
            nome: "Ana".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().to_path_buf());

        storage.save("tok-123", &user()).unwrap();
        let (token, loaded) = storage.load().unwrap();
        assert_eq!(token, "tok-123");
        assert_eq!(loaded, user());
    }

    #[test]
    fn test_load_empty_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().join("sessao"));
        assert!(storage.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_half_present_pair_is_cleared() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().to_path_buf());

        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();
        assert!(storage.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_user_clears_both() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().to_path_buf());

        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();
        fs::write(dir.path().join(USER_FILE), "{not json").unwrap();
        assert!(storage.load().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path().to_path_buf());

        storage.save("tok", &user()).unwrap();
        storage.clear();
        storage.clear();
        assert!(storage.is_empty());
    }
}
