//! Persisted authentication state.
//!
//! A session is stored as one document with two named slots, the opaque
//! token and the user profile. The document is replaced with a rename so a
//! reader never observes one slot without the other; a document missing
//! either slot loads as no session at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use orbitguard_api_client::{SubscriptionTier, UserProfile};
use serde::{Deserialize, Serialize};

pub const SESSION_TOKEN_SLOT: &str = "orbitGuardToken";
pub const SESSION_USER_SLOT: &str = "orbitGuardUser";
const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub credential: String,
    pub profile: UserProfile,
}

impl Session {
    pub fn new(credential: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            credential: credential.into(),
            profile,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.profile.email
    }

    #[must_use]
    pub fn tier(&self) -> SubscriptionTier {
        self.profile.plan
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store io failed at {path}: {message}")]
    Io { path: String, message: String },
    #[error("session encode failed: {0}")]
    Encode(String),
}

/// Single-writer store with synchronous semantics.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;
    /// Swaps the profile and keeps the credential. Returns the updated
    /// session, or `None` when there was nothing to update.
    fn replace_profile(&self, profile: &UserProfile)
    -> Result<Option<Session>, SessionStoreError>;
    fn clear(&self) -> Result<(), SessionStoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    version: u32,
    #[serde(
        rename = "orbitGuardToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    token: Option<String>,
    #[serde(
        rename = "orbitGuardUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    user: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: &io::Error) -> SessionStoreError {
        SessionStoreError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }

    fn write_document(&self, session: &Session) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| self.io_error(&error))?;
            }
        }
        let encoded = serde_json::to_string_pretty(&SessionDocument {
            version: SESSION_SCHEMA_VERSION,
            token: Some(session.credential.clone()),
            user: Some(session.profile.clone()),
        })
        .map_err(|error| SessionStoreError::Encode(error.to_string()))?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|error| self.io_error(&error))?;
        fs::rename(&staging, &self.path).map_err(|error| self.io_error(&error))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(&error)),
        };

        let document = match serde_json::from_str::<SessionDocument>(&raw) {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %error,
                    "discarding unreadable session document"
                );
                return Ok(None);
            }
        };
        if document.version != SESSION_SCHEMA_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                version = document.version,
                "discarding session document with unknown schema version"
            );
            return Ok(None);
        }

        match (document.token, document.user) {
            (Some(token), Some(user)) if !token.trim().is_empty() => {
                Ok(Some(Session::new(token, user)))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    "session document is missing the {SESSION_TOKEN_SLOT} or {SESSION_USER_SLOT} slot"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.write_document(session)
    }

    fn replace_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Option<Session>, SessionStoreError> {
        let Some(mut session) = self.load()? else {
            return Ok(None);
        };
        session.profile = profile.clone();
        self.write_document(&session)?;
        Ok(Some(session))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.io_error(&error)),
        }
    }
}

/// Process-local store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn replace_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Option<Session>, SessionStoreError> {
        let mut slot = self.slot();
        Ok(slot.as_mut().map(|session| {
            session.profile = profile.clone();
            session.clone()
        }))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro_session() -> Session {
        Session::new(
            "tok_8f2c",
            UserProfile {
                email: "ops@orbit.test".to_string(),
                plan: SubscriptionTier::Pro,
            },
        )
    }

    #[test]
    fn file_store_round_trips_session() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(temp.path().join("nested").join("session.v1.json"));
        assert_eq!(store.load().expect("empty load"), None);

        let session = pro_session();
        store.save(&session).expect("save");
        assert_eq!(store.load().expect("load"), Some(session.clone()));

        let reopened = FileSessionStore::new(store.path().to_path_buf());
        assert_eq!(reopened.load().expect("reload"), Some(session));
    }

    #[test]
    fn file_store_writes_both_named_slots() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(temp.path().join("session.v1.json"));
        store.save(&pro_session()).expect("save");

        let raw = fs::read_to_string(store.path()).expect("read document");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value[SESSION_TOKEN_SLOT], serde_json::json!("tok_8f2c"));
        assert_eq!(
            value[SESSION_USER_SLOT],
            serde_json::json!({"email": "ops@orbit.test", "plan": "pro"})
        );
    }

    #[test]
    fn half_present_document_loads_as_absent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("session.v1.json");
        fs::write(&path, r#"{"version":1,"orbitGuardToken":"tok_only"}"#).expect("write");
        assert_eq!(FileSessionStore::new(&path).load().expect("load"), None);

        fs::write(
            &path,
            r#"{"version":1,"orbitGuardUser":{"email":"a@b.c","plan":"free"}}"#,
        )
        .expect("write");
        assert_eq!(FileSessionStore::new(&path).load().expect("load"), None);
    }

    #[test]
    fn corrupt_document_loads_as_absent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("session.v1.json");
        fs::write(&path, "not json").expect("write corrupt file");
        assert_eq!(FileSessionStore::new(&path).load().expect("load"), None);
    }

    #[test]
    fn replace_profile_keeps_credential() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(temp.path().join("session.v1.json"));
        let mut session = pro_session();
        session.profile.plan = SubscriptionTier::Free;
        store.save(&session).expect("save");

        let upgraded = store
            .replace_profile(&UserProfile {
                email: "ops@orbit.test".to_string(),
                plan: SubscriptionTier::Pro,
            })
            .expect("replace")
            .expect("session present");
        assert_eq!(upgraded.credential, "tok_8f2c");
        assert_eq!(upgraded.tier(), SubscriptionTier::Pro);
        assert_eq!(store.load().expect("load"), Some(upgraded));
    }

    #[test]
    fn replace_profile_without_session_is_none() {
        let store = MemorySessionStore::new();
        let result = store
            .replace_profile(&pro_session().profile)
            .expect("replace");
        assert_eq!(result, None);
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn clear_removes_both_slots_and_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(temp.path().join("session.v1.json"));
        store.save(&pro_session()).expect("save");
        store.clear().expect("clear");
        store.clear().expect("second clear");
        assert_eq!(store.load().expect("load"), None);
        assert!(!store.path().exists());

        let memory = MemorySessionStore::with_session(pro_session());
        memory.clear().expect("clear");
        assert_eq!(memory.load().expect("load"), None);
    }
}
