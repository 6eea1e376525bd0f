//! Credential store capability: get/save/remove by key.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::ThreelegError;

pub const TOKEN_KEY_SUFFIX: &str = "_key";
pub const SECRET_KEY_SUFFIX: &str = "_secret";

/// A key/value secret store. Implementations own their locking.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ThreelegError>;

    fn save(&self, key: &str, value: &str) -> Result<(), ThreelegError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), ThreelegError>;
}

/// Store keys for one callback: `<callback>_key` and `<callback>_secret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub token: String,
    pub secret: String,
}

impl CredentialKeys {
    pub fn for_callback(callback: &str) -> Self {
        Self {
            token: format!("{callback}{TOKEN_KEY_SUFFIX}"),
            secret: format!("{callback}{SECRET_KEY_SUFFIX}"),
        }
    }
}
