//! Client-side key-value slots backing the credential store.
//!
//! Two kinds of storage sit behind [`CredentialStore`](super::CredentialStore):
//! - a *durable* slot ([`DurableSlot`]): small, expiring, survives restarts
//!   (the cookie-like jar holding the serialized session)
//! - an *ephemeral* slot ([`EphemeralSlot`]): no expiry, lives as long as the
//!   process (UI preferences and the redirect-return marker)

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::SessionError;

/// Expiring key-value storage that survives a restart.
pub trait DurableSlot: Send + Sync + std::fmt::Debug {
    /// Read a live value. Expired entries read as absent.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value that expires `ttl` from now, replacing any previous value.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl SlotEntry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Looks up `key`, purging it when expired. Returns whether the map changed.
fn read_live(entries: &mut HashMap<String, SlotEntry>, key: &str) -> (Option<String>, bool) {
    match entries.get(key) {
        Some(entry) if entry.is_live(Utc::now()) => (Some(entry.value.clone()), false),
        Some(_) => {
            entries.remove(key);
            (None, true)
        }
        None => (None, false),
    }
}

/// In-process durable slot, used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: RwLock<HashMap<String, SlotEntry>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut entries = self.entries.write();
        Ok(read_live(&mut entries, key).0)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        self.entries
            .write()
            .insert(key.to_string(), SlotEntry::new(value, ttl));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// File-backed durable slot: a JSON jar of entries with absolute expiry times.
///
/// ```text
/// <data_dir>/credentials.json
/// { "user": { "value": "{...}", "expires_at": "2026-01-01T00:00:00Z" } }
/// ```
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSlot {
    pub const FILENAME: &'static str = "credentials.json";

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Slot stored as [`FileSlot::FILENAME`] inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, SlotEntry>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|source| SessionError::Jar {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &HashMap<String, SlotEntry>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries).map_err(SessionError::Serialize)?;

        // Write a sibling temp file, then rename over the jar
        let temp_path = self.temp_path();
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // The mode only applies on creation; tighten a temp file left over from
        // an earlier crash too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&temp_path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&temp_path, perms)?;
        }

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| Self::FILENAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DurableSlot for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        let (value, purged) = read_live(&mut entries, key);
        if purged {
            self.save(&entries)?;
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), SlotEntry::new(value, ttl));
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(SessionError::Jar { path, source }) => {
                // An unreadable jar holds nothing worth keeping
                tracing::warn!(path = %path.display(), error = %source, "Discarding unreadable credential jar");
                std::fs::remove_file(&path)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Per-process key-value storage with no expiry.
#[derive(Debug, Default)]
pub struct EphemeralSlot {
    values: RwLock<HashMap<String, String>>,
}

impl EphemeralSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot_roundtrip() {
        let slot = MemorySlot::new();
        slot.set("user", "value", Duration::hours(1)).unwrap();
        assert_eq!(slot.get("user").unwrap().as_deref(), Some("value"));

        slot.remove("user").unwrap();
        assert!(slot.get("user").unwrap().is_none());
    }

    #[test]
    fn test_memory_slot_expired_entry_reads_as_absent() {
        let slot = MemorySlot::new();
        slot.set("user", "value", Duration::zero()).unwrap();
        assert!(slot.get("user").unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let slot = MemorySlot::new();
        assert!(slot.remove("user").is_ok());
        assert!(slot.remove("user").is_ok());
    }

    #[test]
    fn test_file_slot_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let slot = FileSlot::in_dir(dir.path());
        slot.set("user", "{\"token\":\"t\"}", Duration::hours(1))
            .unwrap();

        // Re-open from the same directory
        let reopened = FileSlot::in_dir(dir.path());
        assert_eq!(
            reopened.get("user").unwrap().as_deref(),
            Some("{\"token\":\"t\"}")
        );
    }

    #[test]
    fn test_file_slot_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::in_dir(dir.path());

        slot.set("user", "value", Duration::hours(1)).unwrap();
        slot.set("user", "newer", Duration::hours(1)).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![FileSlot::FILENAME.to_string()]);
        assert_eq!(slot.get("user").unwrap().as_deref(), Some("newer"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_slot_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        slot.set("user", "secret", Duration::hours(1)).unwrap();

        let mode = std::fs::metadata(slot.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_jar_fails_reads_but_can_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        std::fs::write(slot.path(), "{\"user\": {\"val").unwrap();

        assert!(matches!(slot.get("user"), Err(SessionError::Jar { .. })));

        slot.remove("user").unwrap();
        assert!(!slot.path().exists());
        assert!(slot.get("user").unwrap().is_none());

        slot.set("user", "fresh", Duration::hours(1)).unwrap();
        assert_eq!(slot.get("user").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_file_slot_purges_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::in_dir(dir.path());

        slot.set("user", "stale", Duration::zero()).unwrap();
        slot.set("other", "fresh", Duration::hours(1)).unwrap();

        assert!(slot.get("user").unwrap().is_none());
        let content = std::fs::read_to_string(slot.path()).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("fresh"));
    }

    #[test]
    fn test_file_slot_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested").join("jar.json"));

        assert!(slot.get("user").unwrap().is_none());
        assert!(slot.remove("user").is_ok());
        assert!(!slot.path().exists());
    }

    #[test]
    fn test_ephemeral_slot() {
        let slot = EphemeralSlot::new();
        assert!(slot.get("skin").is_none());

        slot.set("skin", "deep");
        assert_eq!(slot.get("skin").as_deref(), Some("deep"));

        slot.set("skin", "");
        assert_eq!(slot.get("skin").as_deref(), Some(""));

        slot.remove("skin");
        assert!(slot.get("skin").is_none());
    }
}
