//! Persistence of the whitelisted client state.
//!
//! Only the session (token and user) and the preferences survive a restart.
//! Domain collections are always refetched from the server.
//!
//! Saving is fire-and-forget: a failed write is logged and never reaches the
//! user. Each snapshot carries a [`PersistedState::sequence`] taken when the
//! reducer produced it; backends drop a save older than the last one written,
//! so concurrent save effects cannot roll the stored state back.

use crate::app::AppState;
use crate::preferences::PreferencesState;
use crate::session::SessionState;
use crate::types::UserProfile;
use chrono::{DateTime, Utc};
use pocketbook_core::Effect;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Current layout version of [`PersistedState`]
pub const STATE_VERSION: u32 = 1;

/// Errors raised by a [`StateStorage`] backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded
    #[error("Stored state is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored document was written by an unknown layout version
    #[error("Unsupported stored state version {0}")]
    UnsupportedVersion(u32),
}

/// Persisted part of the session slice
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Bearer token
    pub token: Option<String>,
    /// Signed-in user
    pub user: Option<UserProfile>,
}

/// Snapshot of the whitelisted slices
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Layout version
    pub version: u32,
    /// When the snapshot was taken
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// Session token and user
    #[serde(default)]
    pub session: PersistedSession,
    /// User preferences
    #[serde(default)]
    pub preferences: PreferencesState,
    /// Position of the snapshot in save order; not stored
    #[serde(skip)]
    pub sequence: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            saved_at: None,
            session: PersistedSession::default(),
            preferences: PreferencesState::default(),
            sequence: 0,
        }
    }
}

impl PersistedState {
    /// Take the whitelisted snapshot of `state`
    #[must_use]
    pub fn capture(state: &AppState) -> Self {
        Self::from_slices(&state.session, &state.preferences)
    }

    /// Build a snapshot from the whitelisted slices
    #[must_use]
    pub fn from_slices(session: &SessionState, preferences: &PreferencesState) -> Self {
        Self {
            version: STATE_VERSION,
            saved_at: None,
            session: PersistedSession {
                token: session.token.clone(),
                user: session.user.clone(),
            },
            preferences: preferences.clone(),
            sequence: 0,
        }
    }

    /// Stamp the snapshot time
    #[must_use]
    pub const fn saved_at(mut self, at: DateTime<Utc>) -> Self {
        self.saved_at = Some(at);
        self
    }

    /// Tag the snapshot with its position in save order
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Whether the whitelisted content (ignoring the timestamp) differs
    #[must_use]
    pub fn content_differs(&self, other: &Self) -> bool {
        self.session != other.session || self.preferences != other.preferences
    }
}

/// Backend for the persisted snapshot
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the storage can live
/// behind `Arc<dyn StateStorage>` inside the environment.
pub trait StateStorage: Send + Sync {
    /// Load the stored snapshot, `None` if nothing was saved yet
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read or holds a
    /// malformed document.
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<PersistedState>, StorageError>> + Send + '_>>;

    /// Replace the stored snapshot
    ///
    /// A snapshot whose `sequence` is lower than the last one written is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be written.
    fn save(&self, state: PersistedState) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;
}

/// Source of unique temporary file names
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// JSON file storage
///
/// Writes go to a uniquely named sibling temporary file that is then renamed
/// over the target, so a crash never leaves a half-written document. Saves
/// through one storage (and its clones) are serialized.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    /// Sequence of the last written snapshot; held across write and rename
    last_written: Arc<tokio::sync::Mutex<u64>>,
}

impl FileStorage {
    /// Store the snapshot at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: Arc::new(tokio::sync::Mutex::new(0)),
        }
    }

    /// Location of the snapshot
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        self.path.with_file_name(name)
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<PersistedState>, StorageError>> + Send + '_>> {
        Box::pin(async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(error) => return Err(error.into()),
            };

            let state: PersistedState = serde_json::from_slice(&bytes)?;
            if state.version > STATE_VERSION {
                return Err(StorageError::UnsupportedVersion(state.version));
            }
            Ok(Some(state))
        })
    }

    fn save(&self, state: PersistedState) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        Box::pin(async move {
            let mut last_written = self.last_written.lock().await;
            if state.sequence < *last_written {
                tracing::trace!(
                    sequence = state.sequence,
                    last_written = *last_written,
                    "Skipping stale snapshot"
                );
                return Ok(());
            }

            let bytes = serde_json::to_vec_pretty(&state)?;
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let temp = self.temp_path();
            if let Err(error) = tokio::fs::write(&temp, bytes).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(error.into());
            }
            tokio::fs::rename(&temp, &self.path).await?;
            *last_written = state.sequence;
            Ok(())
        })
    }
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<Option<PersistedState>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStorage {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `state`
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        let storage = Self::default();
        *storage.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
        storage
    }

    /// Last saved snapshot
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of saves that replaced the snapshot
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<PersistedState>, StorageError>> + Send + '_>> {
        let snapshot = self.snapshot();
        Box::pin(async move { Ok(snapshot) })
    }

    fn save(&self, state: PersistedState) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        {
            let mut stored = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if stored.as_ref().is_some_and(|current| state.sequence < current.sequence) {
                return Box::pin(async { Ok(()) });
            }
            *stored = Some(state);
            *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        }
        Box::pin(async { Ok(()) })
    }
}

/// Effect that writes `snapshot` to `storage`, logging failures
pub fn persist_effect<A: Send + 'static>(
    storage: Arc<dyn StateStorage>,
    snapshot: PersistedState,
) -> Effect<A> {
    Effect::future(async move {
        match storage.save(snapshot).await {
            Ok(()) => tracing::trace!("Persisted state saved"),
            Err(error) => tracing::warn!(error = %error, "Failed to persist state"),
        }
        None
    })
}

/// Load the persisted snapshot, treating unreadable storage as empty
pub async fn load_or_default(storage: &dyn StateStorage) -> PersistedState {
    match storage.load().await {
        Ok(Some(state)) => state,
        Ok(None) => PersistedState::default(),
        Err(error) => {
            tracing::warn!(error = %error, "Discarding unreadable persisted state");
            PersistedState::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::Theme;

    fn snapshot() -> PersistedState {
        PersistedState {
            session: PersistedSession {
                token: Some("tok".to_string()),
                user: Some(UserProfile {
                    id: "u1".to_string(),
                    name: "Ana".to_string(),
                    email: "ana@example.com".to_string(),
                }),
            },
            preferences: PreferencesState { theme: Theme::Dark },
            ..PersistedState::default()
        }
    }

    fn themed(theme: Theme) -> PersistedState {
        PersistedState {
            preferences: PreferencesState { theme },
            ..PersistedState::default()
        }
    }

    async fn dir_entries(path: &std::path::Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(path.parent().unwrap_or(path)).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pocketbook-test-{}-{name}", std::process::id()))
            .join("state.json")
    }

    #[tokio::test]
    async fn file_storage_round_trip() -> Result<(), StorageError> {
        let path = temp_file("round-trip");
        let storage = FileStorage::new(&path);

        assert_eq!(storage.load().await?, None);
        storage.save(snapshot()).await?;
        assert_eq!(storage.load().await?, Some(snapshot()));
        assert_eq!(dir_entries(&path).await?, vec!["state.json".to_string()]);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap_or(&path)).await;
        Ok(())
    }

    #[tokio::test]
    async fn file_storage_skips_stale_snapshot() -> Result<(), StorageError> {
        let path = temp_file("stale");
        let storage = FileStorage::new(&path);

        storage.save(themed(Theme::Dark).with_sequence(2)).await?;
        storage.save(themed(Theme::Light).with_sequence(1)).await?;

        let stored = storage.load().await?.map(|s| s.preferences.theme);
        assert_eq!(stored, Some(Theme::Dark));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap_or(&path)).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_file_saves_keep_latest_sequence() -> Result<(), StorageError> {
        let path = temp_file("concurrent");
        let storage = FileStorage::new(&path);

        let saves = (1..=40u64).rev().map(|sequence| {
            let storage = storage.clone();
            let theme = if sequence % 2 == 0 { Theme::Dark } else { Theme::Light };
            tokio::spawn(async move { storage.save(themed(theme).with_sequence(sequence)).await })
        });
        for result in futures::future::join_all(saves).await {
            result.map_err(std::io::Error::other)??;
        }

        let stored = storage.load().await?.map(|s| s.preferences.theme);
        assert_eq!(stored, Some(Theme::Dark));
        assert_eq!(dir_entries(&path).await?, vec!["state.json".to_string()]);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap_or(&path)).await;
        Ok(())
    }

    #[test]
    fn temp_paths_are_unique_siblings() {
        let storage = FileStorage::new("/var/lib/pocketbook/state.json");
        let first = storage.temp_path();
        let second = storage.temp_path();

        assert_ne!(first, second);
        assert_eq!(first.parent(), storage.path().parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[tokio::test]
    async fn malformed_file_is_discarded() -> Result<(), StorageError> {
        let path = temp_file("malformed");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, b"{not json").await?;

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.load().await, Err(StorageError::Serialization(_))));
        assert_eq!(load_or_default(&storage).await, PersistedState::default());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap_or(&path)).await;
        Ok(())
    }

    #[tokio::test]
    async fn newer_version_is_rejected() -> Result<(), StorageError> {
        let path = temp_file("version");
        let storage = FileStorage::new(&path);
        storage
            .save(PersistedState {
                version: STATE_VERSION + 1,
                ..snapshot()
            })
            .await?;

        assert!(matches!(
            storage.load().await,
            Err(StorageError::UnsupportedVersion(v)) if v == STATE_VERSION + 1
        ));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap_or(&path)).await;
        Ok(())
    }

    #[test]
    fn persisted_json_contains_only_whitelisted_slices() {
        let json = serde_json::to_value(snapshot()).unwrap_or_default();
        let keys: Vec<&str> = json
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();

        assert_eq!(keys.len(), 4);
        for key in ["version", "saved_at", "session", "preferences"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn content_differs_ignores_timestamp() {
        let a = snapshot();
        let b = snapshot().saved_at(Utc::now());
        assert!(!a.content_differs(&b));

        let mut c = snapshot();
        c.preferences.theme = Theme::Light;
        assert!(a.content_differs(&c));
    }

    #[tokio::test]
    async fn memory_storage_counts_saves() -> Result<(), StorageError> {
        let storage = MemoryStorage::new();
        storage.save(snapshot()).await?;
        storage.save(snapshot()).await?;

        assert_eq!(storage.save_count(), 2);
        assert_eq!(storage.load().await?, Some(snapshot()));
        Ok(())
    }

    #[tokio::test]
    async fn memory_storage_skips_stale_snapshot() -> Result<(), StorageError> {
        let storage = MemoryStorage::new();
        storage.save(themed(Theme::Dark).with_sequence(5)).await?;
        storage.save(themed(Theme::Light).with_sequence(4)).await?;

        assert_eq!(storage.save_count(), 1);
        assert_eq!(storage.snapshot().map(|s| s.preferences.theme), Some(Theme::Dark));
        Ok(())
    }
}
