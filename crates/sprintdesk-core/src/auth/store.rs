use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::Credential;

/// Storage key: credential file name inside the data directory
pub const CREDENTIAL_FILE: &str = "credential.json";

/// What changed in the store. Listeners call `get()` for the new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialEvent {
    Set,
    Cleared,
}

type Listener = Arc<dyn Fn(CredentialEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Slot {
    credential: Option<Credential>,
    /// Bumped by every set/clear; lets callers detect intervening writes.
    version: u64,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Single owner of the current `Credential`, optionally backed by a file.
///
/// Writes are serialized by one lock, and listeners are notified after that
/// lock is released, in subscription order.
pub struct CredentialStore {
    path: Option<PathBuf>,
    slot: Mutex<Slot>,
    listeners: Arc<Mutex<Listeners>>,
}

impl CredentialStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            slot: Mutex::new(Slot::default()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Open the store persisted in `data_dir`, loading any saved credential.
    ///
    /// An unreadable or corrupt file counts as logged out and is removed.
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join(CREDENTIAL_FILE);
        let credential = match Self::read_file(&path) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Discarding unreadable credential file");
                if let Err(e) = std::fs::remove_file(&path) {
                    debug!(error = %e, "Could not remove credential file");
                }
                None
            }
        };
        debug!(has_credential = credential.is_some(), "Credential store opened");

        Self {
            path: Some(path),
            slot: Mutex::new(Slot {
                credential,
                version: 0,
            }),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    fn read_file(path: &Path) -> Result<Option<Credential>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read credential file")?;
        let credential: Credential =
            serde_json::from_str(&contents).context("Failed to parse credential file")?;
        Ok(Some(credential))
    }

    /// Write via a temp file and rename so readers never see half a file.
    fn write_file(path: &Path, credential: &Credential) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(&tmp, contents).context("Failed to write credential file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, path).context("Failed to replace credential file")?;
        Ok(())
    }

    fn remove_file(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credential file")?;
        }
        Ok(())
    }

    /// Current snapshot.
    pub fn get(&self) -> Option<Credential> {
        lock(&self.slot).credential.clone()
    }

    /// Snapshot together with the write version it was read at.
    pub fn snapshot(&self) -> (Option<Credential>, u64) {
        let slot = lock(&self.slot);
        (slot.credential.clone(), slot.version)
    }

    /// Replace the credential and notify subscribers.
    pub fn set(&self, credential: Credential) {
        self.write(None, Some(credential));
    }

    /// Remove the credential and notify subscribers. No-op when already absent.
    pub fn clear(&self) {
        self.write(None, None);
    }

    /// `set` that only applies when no write happened since `version`.
    pub fn set_if_version(&self, version: u64, credential: Credential) -> bool {
        self.write(Some(version), Some(credential))
    }

    /// `clear` that only applies when no write happened since `version`.
    pub fn clear_if_version(&self, version: u64) -> bool {
        self.write(Some(version), None)
    }

    fn write(&self, expected: Option<u64>, credential: Option<Credential>) -> bool {
        let event = {
            let mut slot = lock(&self.slot);
            if expected.is_some_and(|v| v != slot.version) {
                debug!(expected = ?expected, actual = slot.version, "Skipping stale credential write");
                return false;
            }
            if credential.is_none() && slot.credential.is_none() {
                return false;
            }

            if let Some(ref path) = self.path {
                let persisted = match credential {
                    Some(ref c) => Self::write_file(path, c),
                    None => Self::remove_file(path),
                };
                if let Err(e) = persisted {
                    warn!(error = %e, "Failed to persist credential change");
                }
            }

            let event = if credential.is_some() {
                CredentialEvent::Set
            } else {
                CredentialEvent::Cleared
            };
            slot.credential = credential;
            slot.version += 1;
            event
        };

        self.notify(event);
        true
    }

    fn notify(&self, event: CredentialEvent) {
        let listeners: Vec<Listener> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Register a listener; it stays registered until the returned
    /// `Subscription` is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(CredentialEvent) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

/// Registration handle returned by `CredentialStore::subscribe`.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LoginResponse;
    use chrono::Utc;

    fn credential(token: &str) -> Credential {
        Credential::from_response(&LoginResponse::new(token, 3600, "r", 86400), Utc::now())
            .expect("complete response")
    }

    #[test]
    fn test_set_get_clear() {
        let store = CredentialStore::in_memory();
        assert!(store.get().is_none());

        store.set(credential("a1"));
        assert_eq!(store.get().map(|c| c.access_token), Some("a1".to_string()));

        store.set(credential("a2"));
        assert_eq!(store.get().map(|c| c.access_token), Some("a2".to_string()));

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_listeners_notified_in_order_after_write() {
        let store = Arc::new(CredentialStore::in_memory());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = {
            let seen = Arc::clone(&seen);
            let observed = Arc::clone(&store);
            store.subscribe(move |event| {
                // The write is already visible when listeners run
                let present = observed.get().is_some();
                lock(&seen).push(("first", event, present));
            })
        };
        let s2 = {
            let seen = Arc::clone(&seen);
            store.subscribe(move |event| lock(&seen).push(("second", event, false)))
        };

        store.set(credential("a1"));
        store.clear();

        let seen = lock(&seen).clone();
        assert_eq!(
            seen,
            vec![
                ("first", CredentialEvent::Set, true),
                ("second", CredentialEvent::Set, false),
                ("first", CredentialEvent::Cleared, false),
                ("second", CredentialEvent::Cleared, false),
            ]
        );
        drop((s1, s2));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = CredentialStore::in_memory();
        let count = Arc::new(Mutex::new(0));
        let _sub = {
            let count = Arc::clone(&count);
            store.subscribe(move |_| *lock(&count) += 1)
        };

        store.clear();
        store.clear();
        assert_eq!(*lock(&count), 0);

        store.set(credential("a1"));
        store.clear();
        store.clear();
        assert_eq!(*lock(&count), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = CredentialStore::in_memory();
        let count = Arc::new(Mutex::new(0));
        let sub = {
            let count = Arc::clone(&count);
            store.subscribe(move |_| *lock(&count) += 1)
        };
        assert_eq!(store.subscriber_count(), 1);

        store.set(credential("a1"));
        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);

        store.set(credential("a2"));
        assert_eq!(*lock(&count), 1);
    }

    #[test]
    fn test_versioned_writes_skip_after_intervening_write() {
        let store = CredentialStore::in_memory();
        store.set(credential("a1"));
        let (_, version) = store.snapshot();

        store.clear();
        assert!(!store.set_if_version(version, credential("a2")));
        assert!(store.get().is_none());

        let (_, version) = store.snapshot();
        assert!(store.set_if_version(version, credential("a3")));
        assert!(!store.clear_if_version(version));
        assert_eq!(store.get().map(|c| c.access_token), Some("a3".to_string()));
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = CredentialStore::open(dir.path());
        store.set(credential("a1"));
        drop(store);

        let reopened = CredentialStore::open(dir.path());
        assert_eq!(reopened.get().map(|c| c.access_token), Some("a1".to_string()));

        reopened.clear();
        assert!(!dir.path().join(CREDENTIAL_FILE).exists());
        assert!(CredentialStore::open(dir.path()).get().is_none());
    }

    #[test]
    fn test_corrupt_file_heals_to_logged_out() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CREDENTIAL_FILE);
        std::fs::write(&path, "{ not json").expect("write corrupt file");

        let store = CredentialStore::open(dir.path());
        assert!(store.get().is_none());
        assert!(!path.exists());
    }
}
