//! API credentials: environment first, then the OS keyring.
//!
//! Credentials are only stored and looked up here; obtaining or refreshing
//! an access token happens outside this tool.

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "CC_API_KEY";
pub const ACCESS_TOKEN_ENV: &str = "CC_ACCESS_TOKEN";

const API_KEY_ENTRY: &str = "api_key";
const ACCESS_TOKEN_ENTRY: &str = "access_token";

/// API key and bearer token for the service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Keyring,
    Missing,
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::ConfigError;

    const SERVICE: &str = "listsync";

    pub fn get(key: &str) -> Result<Option<String>, ConfigError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), ConfigError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), ConfigError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Credentials {
    /// Resolve both credentials.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingKey` names the first credential found in neither place.
    pub fn resolve() -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_ENV, API_KEY_ENTRY)?
            .ok_or_else(|| ConfigError::MissingKey(API_KEY_ENV.to_string()))?;
        let access_token = lookup(ACCESS_TOKEN_ENV, ACCESS_TOKEN_ENTRY)?
            .ok_or_else(|| ConfigError::MissingKey(ACCESS_TOKEN_ENV.to_string()))?;
        Ok(Self {
            api_key,
            access_token,
        })
    }

    /// Store both credentials in the keyring.
    pub fn store(&self) -> Result<(), ConfigError> {
        keyring_store::set(API_KEY_ENTRY, &self.api_key)?;
        keyring_store::set(ACCESS_TOKEN_ENTRY, &self.access_token)?;
        Ok(())
    }

    /// Remove both credentials from the keyring.
    pub fn clear() -> Result<(), ConfigError> {
        keyring_store::delete(API_KEY_ENTRY)?;
        keyring_store::delete(ACCESS_TOKEN_ENTRY)?;
        Ok(())
    }

    /// Where the API key and access token would currently be read from.
    pub fn sources() -> (CredentialSource, CredentialSource) {
        (
            source_of(API_KEY_ENV, API_KEY_ENTRY),
            source_of(ACCESS_TOKEN_ENV, ACCESS_TOKEN_ENTRY),
        )
    }
}

fn from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn lookup(var: &str, entry: &str) -> Result<Option<String>, ConfigError> {
    if let Some(value) = from_env(var) {
        return Ok(Some(value));
    }
    keyring_store::get(entry)
}

fn source_of(var: &str, entry: &str) -> CredentialSource {
    if from_env(var).is_some() {
        return CredentialSource::Environment;
    }
    match keyring_store::get(entry) {
        Ok(Some(_)) => CredentialSource::Keyring,
        _ => CredentialSource::Missing,
    }
}
