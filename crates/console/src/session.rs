//! Application context: operator session, persisted preferences and the
//! credential check. Opened once at startup, closed on exit.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use common::{
    error::ValidationError,
    notifications::{Notifier, Toast},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
}

pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// A missing file means first start. A corrupt one is replaced on the next save.
    pub fn load(&self) -> Result<Preferences, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_str(&raw) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                warn!("Ignoring unreadable preferences {}: {}", self.path.display(), e);
                Ok(Preferences::default())
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;

    fn replace_password(&mut self, new_password: &str);
}

/// Compares the hex SHA-256 digest of the entered password.
pub struct Sha256Verifier {
    username: String,
    digest_hex: String,
}

impl Sha256Verifier {
    pub fn new(username: &str, digest_hex: &str) -> Self {
        Self {
            username: username.to_string(),
            digest_hex: digest_hex.trim().to_lowercase(),
        }
    }

    pub fn digest(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }
}

impl CredentialVerifier for Sha256Verifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && Self::digest(password) == self.digest_hex
    }

    fn replace_password(&mut self, new_password: &str) {
        self.digest_hex = Self::digest(new_password);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub started_at: DateTime<Utc>,
}

pub struct AppContext {
    store: PreferenceStore,
    preferences: Preferences,
    session: Option<Session>,
    verifier: Box<dyn CredentialVerifier>,
    notifier: Notifier,
}

impl AppContext {
    pub fn open(
        store: PreferenceStore,
        verifier: Box<dyn CredentialVerifier>,
        notifier: Notifier,
    ) -> Result<Self, SessionError> {
        let preferences = store.load()?;
        Ok(Self {
            store,
            preferences,
            session: None,
            verifier,
            notifier,
        })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require_session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotLoggedIn)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<&Session, SessionError> {
        if !self.verifier.verify(username, password) {
            warn!("Rejected login for {}", username);
            return Err(SessionError::InvalidCredentials);
        }
        info!("{} logged in", username);
        Ok(self.session.insert(Session {
            username: username.to_string(),
            started_at: Utc::now(),
        }))
    }

    pub fn logout(&mut self) -> Option<Session> {
        let ended = self.session.take();
        if let Some(ref session) = ended {
            info!("{} logged out", session.username);
        }
        ended
    }

    pub fn change_password(
        &mut self,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), SessionError> {
        let username = self.require_session()?.username.clone();

        if !self.verifier.verify(&username, current) {
            return Err(ValidationError::IncorrectPassword.into());
        }
        if new_password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }

        self.verifier.replace_password(new_password);
        info!("Password changed for {}", username);
        self.notifier.notify(Toast::success(
            "Password Changed",
            "Your password has been updated successfully.",
        ));
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, SessionError> {
        self.preferences.theme = match self.preferences.theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
        self.store.save(&self.preferences)?;
        Ok(self.preferences.theme)
    }

    pub fn toggle_sidebar(&mut self) -> Result<bool, SessionError> {
        self.preferences.sidebar_collapsed = !self.preferences.sidebar_collapsed;
        self.store.save(&self.preferences)?;
        Ok(self.preferences.sidebar_collapsed)
    }

    pub fn close(mut self) -> Result<(), SessionError> {
        self.logout();
        self.store.save(&self.preferences)
    }
}
