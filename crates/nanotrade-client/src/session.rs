//! # Auth Session
//!
//! The signed in user as the client remembers it: token, user and business
//! profile.
//!
//! ```text
//! login/register ──► sign_in(LoginResponse) ──► session.json
//!                                                   │
//! next start ──► AuthSession::load(path) ◄──────────┘
//!                    │                              │
//!                    ▼                              │
//!      ApiClient::restore_session()                 │
//!                    │ 401                          │
//! logout ────────────┴──► sign_out() ──► file removed
//! ```
//!
//! Only `logout` and `restore_session` sign out; a 401 from any other call
//! is returned to the caller with the session left as it is.
//!
//! A session without a path lives in memory only.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nanotrade_core::{BusinessInformation, LoginResponse, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSession {
    token: Option<String>,
    user: Option<User>,
    business: Option<BusinessInformation>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl AuthSession {
    pub fn in_memory() -> Self {
        AuthSession::default()
    }

    /// Restores the session stored at `path`.
    ///
    /// A missing file gives an empty session bound to that path. A file that
    /// no longer parses is treated the same way, so a stale format never
    /// blocks signing in again.
    pub fn load(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let mut session = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AuthSession>(&contents) {
                Ok(session) => session,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                    AuthSession::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => AuthSession::default(),
            Err(e) => return Err(e.into()),
        };
        session.path = Some(path);
        Ok(session)
    }

    /// Remembers the result of a login or registration.
    pub fn sign_in(&mut self, response: LoginResponse) -> ClientResult<()> {
        debug!(user = %response.user.username, "Signed in");
        self.token = Some(response.token);
        self.user = Some(response.user);
        self.business = response.business;
        self.save()
    }

    /// Replaces the cached user after a profile update.
    pub fn set_user(&mut self, user: User) -> ClientResult<()> {
        self.user = Some(user);
        self.save()
    }

    /// Replaces the cached business after it was created or edited.
    pub fn set_business(&mut self, business: BusinessInformation) -> ClientResult<()> {
        self.business = Some(business);
        self.save()
    }

    /// Forgets everything and deletes the session file.
    pub fn sign_out(&mut self) -> ClientResult<()> {
        self.token = None;
        self.user = None;
        self.business = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn business(&self) -> Option<&BusinessInformation> {
        self.business.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn save(&self) -> ClientResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nanotrade_core::{Location, RecordStatus, UserRole};

    fn login_response() -> LoginResponse {
        let now = Utc::now();
        LoginResponse {
            token: "tok-123".to_string(),
            user: User {
                id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
                username: "amina".to_string(),
                email: "amina@shop.cm".to_string(),
                password_hash: String::new(),
                is_staff: false,
                role: UserRole::ShopOwner,
                profile_image: None,
                phone_number: None,
                location: Location::default(),
                status: RecordStatus::Active,
                last_login: None,
                created_at: now,
                updated_at: now,
            },
            business: None,
        }
    }

    #[test]
    fn test_missing_file_gives_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = AuthSession::load(dir.path().join("session.json")).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_sign_in_persists_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = AuthSession::load(&path).unwrap();
        session.sign_in(login_response()).unwrap();
        assert!(path.exists());

        let restored = AuthSession::load(&path).unwrap();
        assert_eq!(restored.token(), Some("tok-123"));
        assert_eq!(restored.user().unwrap().username, "amina");
    }

    #[test]
    fn test_sign_out_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = AuthSession::load(&path).unwrap();
        session.sign_in(login_response()).unwrap();
        session.sign_out().unwrap();

        assert!(!session.is_authenticated());
        assert!(!path.exists());
        // Signing out twice is harmless.
        session.sign_out().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let session = AuthSession::load(&path).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.path(), Some(path.as_path()));
    }

    #[test]
    fn test_in_memory_session_writes_nothing() {
        let mut session = AuthSession::in_memory();
        session.sign_in(login_response()).unwrap();
        assert!(session.is_authenticated());
        assert!(session.path().is_none());
    }
}
