//! Common trait definitions
//!
//! Seams for every external collaborator: file system, keyring, the
//! key/value settings table, push and mail transports, geocoding and PDF
//! rendering. Production implementations live next to the logic that
//! uses them; tests substitute in-memory mocks.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::document::DocumentLayout;
use crate::notify::mail::OutgoingMail;
use crate::notify::push::PushNotification;
use crate::utils::geo::GpsPoint;

/// Trait for file system operations
///
/// Production code uses `StdFileStore`, tests can use mock implementations.
pub trait FileStore: Send + Sync {
    /// Write content to a file, replacing it
    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Read a UTF-8 file, `None` if it does not exist
    fn read_to_string(&self, path: &Path) -> Result<Option<String>>;

    /// Create directory
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Trait for secret storage
///
/// Holds SMTP passwords, push tokens and API keys outside the config
/// file. Production code uses `KeyringCredentialStore`.
pub trait CredentialStore: Send + Sync {
    fn save_secret(&self, key: &str, secret: &str) -> Result<()>;

    fn get_secret(&self, key: &str) -> Result<String>;

    fn delete_secret(&self, key: &str) -> Result<()>;
}

/// Key/value application settings, looked up by exact name
pub trait ConfigStore: Send + Sync {
    /// Insert a new setting
    ///
    /// Fails if a setting with that name already exists.
    fn add(&self, name: &str, content: &str) -> Result<()>;

    /// Replace the content of an existing setting
    ///
    /// Fails if no setting with that name exists.
    fn update(&self, name: &str, content: &str) -> Result<()>;

    /// Content of a setting; `None` if missing or empty
    fn get(&self, name: &str) -> Result<Option<String>>;
}

/// Sends one push notification
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, notification: &PushNotification) -> Result<()>;
}

/// Hands a fully resolved mail to an SMTP server
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Resolves a postal address to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no match for the address
    async fn locate(&self, address: &str) -> Result<Option<GpsPoint>>;
}

/// Turns a planned HTML layout into PDF bytes
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, layout: &DocumentLayout) -> Result<Vec<u8>>;
}
