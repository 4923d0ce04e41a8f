//! State shared by every subcommand.

use std::path::PathBuf;

use listsync_core::{CacheStore, Client, Credentials, Settings};
use tokio_util::sync::CancellationToken;

pub struct Context {
    pub settings: Settings,
    pub config_path: PathBuf,
    pub cache_path: PathBuf,
    pub cancel: CancellationToken,
}

/// Config file location: the `--config` flag, else the default path.
pub fn config_path(flag: Option<PathBuf>) -> listsync_core::Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => Ok(Settings::default_path()?),
    }
}

impl Context {
    pub fn load(
        config_path: PathBuf,
        cache: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> listsync_core::Result<Self> {
        let settings = Settings::load_from(&config_path)?;
        let cache_path = cache.unwrap_or_else(|| settings.paths.cache.clone());

        Ok(Self {
            settings,
            config_path,
            cache_path,
            cancel,
        })
    }

    /// API client using the resolved credentials.
    pub fn client(&self) -> listsync_core::Result<Client> {
        let creds = Credentials::resolve()?;
        let config = self
            .settings
            .client_config(&creds.api_key, &creds.access_token);
        Ok(Client::new(config)?)
    }

    pub fn store(&self) -> CacheStore {
        CacheStore::new(&self.cache_path)
    }
}
