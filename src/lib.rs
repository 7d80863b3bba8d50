//! Fliix helpers library
//!
//! Formatting, validation and notification helpers shared by the Fliix
//! web back end. Modules are exposed for integration testing and for the
//! `fliix-helpers` command-line tool.

pub mod config;
pub mod document;
pub mod geocoding;
pub mod notify;
pub mod outcome;
pub mod stores;
pub mod traits;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use outcome::{DeliveryError, Outcome};
pub use stores::{KeyringCredentialStore, MemoryConfigStore, StdFileStore, YamlConfigStore};
pub use traits::{ConfigStore, CredentialStore, FileStore};
pub use utils::formatting::{format_last_communication, seconds_to_human_time, UnitFilter};
pub use utils::validation::{
    validate_email, validate_or_empty_email, validate_sv_number, validate_tax_id,
};
