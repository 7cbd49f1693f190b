// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed storage for the Fitbit credential pair.

use crate::error::{AppError, Result};
use crate::models::CredentialPair;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and writes the credential pair as a small JSON file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored pair. Returns `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<CredentialPair>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            AppError::TokenStore(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let tokens = serde_json::from_str(&json).map_err(|e| {
            AppError::TokenStore(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(tokens))
    }

    /// Overwrite the stored pair.
    pub fn save(&self, tokens: &CredentialPair) -> Result<()> {
        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AppError::TokenStore(format!("Failed to encode tokens: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::TokenStore(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        // Tokens grant account access; keep them private to the owner
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AppError::TokenStore(format!(
                    "Failed to set permissions on {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }

        tracing::debug!(path = %self.path.display(), "Credential pair saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: &str) -> CredentialPair {
        CredentialPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));

        store.save(&pair("access-1", "refresh-1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair("access-1", "refresh-1")));
    }

    #[test]
    fn test_save_overwrites_whole_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));

        store.save(&pair("access-1", "refresh-1")).unwrap();
        store.save(&pair("access-2", "refresh-2")).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair("access-2", "refresh-2")));
    }

    #[test]
    fn test_load_reads_plain_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(
            &path,
            r#"{"access_token": "a", "refresh_token": "r", "expires_in": 28800}"#,
        )
        .unwrap();

        let store = TokenStore::new(&path);
        assert_eq!(store.load().unwrap(), Some(pair("a", "r")));
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();

        let err = TokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, AppError::TokenStore(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        store.save(&pair("a", "r")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
