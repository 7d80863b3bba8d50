//! Storage implementations for files, secrets and settings
//!
//! Provides the standard file system store, the keyring-backed secret
//! store and two `ConfigStore` backends: an in-memory map and a YAML file.

use crate::traits::{ConfigStore, CredentialStore, FileStore};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Keyring service name all secrets are stored under
pub const KEYRING_SERVICE: &str = "fliix-helpers";

/// Standard filesystem implementation
pub struct StdFileStore;

impl FileStore for StdFileStore {
    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        fs::write(path, content).with_context(|| format!("Failed to write to {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("Failed to create directory {:?}", path))
    }
}

/// Keyring-based secret store
///
/// Uses the system's secure credential storage:
/// - macOS: Keychain
/// - Linux: Secret Service API (libsecret)
/// - Windows: Credential Manager
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    fn entry(key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, key)
            .with_context(|| format!("Failed to create keyring entry for '{}'", key))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_secret(&self, key: &str, secret: &str) -> Result<()> {
        Self::entry(key)?
            .set_password(secret)
            .with_context(|| format!("Failed to save secret '{}'", key))
    }

    fn get_secret(&self, key: &str) -> Result<String> {
        Self::entry(key)?
            .get_password()
            .with_context(|| format!("Failed to retrieve secret '{}'", key))
    }

    fn delete_secret(&self, key: &str) -> Result<()> {
        Self::entry(key)?
            .delete_password()
            .with_context(|| format!("Failed to delete secret '{}'", key))
    }
}

/// Settings in insertion order
type SettingsMap = Vec<(String, String)>;

fn insert_setting(settings: &mut SettingsMap, name: &str, content: &str) -> Result<()> {
    if settings.iter().any(|(n, _)| n == name) {
        bail!("Setting '{}' already exists", name);
    }
    settings.push((name.to_string(), content.to_string()));
    Ok(())
}

fn update_setting(settings: &mut SettingsMap, name: &str, content: &str) -> Result<()> {
    match settings.iter_mut().find(|(n, _)| n == name) {
        Some((_, existing)) => {
            *existing = content.to_string();
            Ok(())
        }
        None => bail!("Setting '{}' does not exist", name),
    }
}

fn lookup_setting(settings: &SettingsMap, name: &str) -> Option<String> {
    settings
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, content)| content.clone())
        .filter(|content| !content.is_empty())
}

/// Settings held in process memory
#[derive(Default)]
pub struct MemoryConfigStore {
    settings: RwLock<SettingsMap>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn add(&self, name: &str, content: &str) -> Result<()> {
        let mut settings = self
            .settings
            .write()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        insert_setting(&mut settings, name, content)
    }

    fn update(&self, name: &str, content: &str) -> Result<()> {
        let mut settings = self
            .settings
            .write()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        update_setting(&mut settings, name, content)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let settings = self
            .settings
            .read()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        Ok(lookup_setting(&settings, name))
    }
}

/// Settings persisted as a YAML list of `{name, content}` entries
///
/// The file is re-read on every call so concurrent CLI invocations see
/// each other's writes.
pub struct YamlConfigStore {
    path: PathBuf,
    files: Arc<dyn FileStore>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SettingEntry {
    name: String,
    content: String,
}

impl YamlConfigStore {
    pub fn new(path: PathBuf, files: Arc<dyn FileStore>) -> Self {
        Self { path, files }
    }

    fn load(&self) -> Result<SettingsMap> {
        let Some(contents) = self.files.read_to_string(&self.path)? else {
            return Ok(Vec::new());
        };

        let entries: Vec<SettingEntry> = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {:?}", self.path))?;
        Ok(entries.into_iter().map(|e| (e.name, e.content)).collect())
    }

    fn store(&self, settings: SettingsMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            self.files.create_dir_all(parent)?;
        }

        let entries: Vec<SettingEntry> = settings
            .into_iter()
            .map(|(name, content)| SettingEntry { name, content })
            .collect();
        let contents = serde_yaml::to_string(&entries)?;
        self.files.write(&self.path, contents.as_bytes())
    }
}

impl ConfigStore for YamlConfigStore {
    fn add(&self, name: &str, content: &str) -> Result<()> {
        let mut settings = self.load()?;
        insert_setting(&mut settings, name, content)?;
        self.store(settings)
    }

    fn update(&self, name: &str, content: &str) -> Result<()> {
        let mut settings = self.load()?;
        update_setting(&mut settings, name, content)?;
        self.store(settings)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(lookup_setting(&self.load()?, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("fliix_helpers_test_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_std_file_store_round_trip() {
        let store = StdFileStore;
        let path = temp_path("file_store/content.txt");

        store.create_dir_all(path.parent().unwrap()).unwrap();
        store.write(&path, b"test content").unwrap();
        assert_eq!(
            store.read_to_string(&path).unwrap().as_deref(),
            Some("test content")
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_std_file_store_missing_file_is_none() {
        let store = StdFileStore;
        assert!(store
            .read_to_string(&temp_path("does/not/exist.txt"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_memory_store_add_get_update() {
        let store = MemoryConfigStore::new();
        store.add("invoice_prefix", "RE-").unwrap();
        assert_eq!(store.get("invoice_prefix").unwrap().as_deref(), Some("RE-"));

        store.update("invoice_prefix", "INV-").unwrap();
        assert_eq!(store.get("invoice_prefix").unwrap().as_deref(), Some("INV-"));
    }

    #[test]
    fn test_memory_store_rejects_duplicates_and_unknown_updates() {
        let store = MemoryConfigStore::new();
        store.add("a", "1").unwrap();
        assert!(store.add("a", "2").is_err());
        assert!(store.update("b", "2").is_err());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_memory_store_empty_content_reads_as_missing() {
        let store = MemoryConfigStore::new();
        store.add("blank", "").unwrap();
        assert_eq!(store.get("blank").unwrap(), None);
        assert_eq!(store.get("never_set").unwrap(), None);
    }

    #[test]
    fn test_yaml_store_persists_between_instances() {
        let path = temp_path("yaml_store/settings.yaml");
        let _ = fs::remove_file(&path);

        let first = YamlConfigStore::new(path.clone(), Arc::new(StdFileStore));
        first.add("maintenance", "off").unwrap();
        first.add("motd", "Hallo").unwrap();
        first.update("maintenance", "on").unwrap();

        let second = YamlConfigStore::new(path.clone(), Arc::new(StdFileStore));
        assert_eq!(second.get("maintenance").unwrap().as_deref(), Some("on"));
        assert_eq!(second.get("motd").unwrap().as_deref(), Some("Hallo"));
        assert!(second.add("motd", "again").is_err());

        let _ = fs::remove_file(&path);
    }
}
