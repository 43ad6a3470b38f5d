//! Configuration loading.
//!
//! ```toml
//! [server]
//! addr = "127.0.0.1:5000"
//! max_body_bytes = 1048576
//!
//! [static_files]
//! root = "static"
//! prefix = "/static/"
//! ```
//!
//! Every key is optional. `EASYAPI_ADDR` in the environment overrides
//! `server.addr` when [`Config::with_env_overrides`] is applied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::server::DEFAULT_MAX_BODY;
use crate::static_files::{StaticAssetResolver, DEFAULT_PREFIX};

pub const ADDR_ENV: &str = "EASYAPI_ADDR";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: Option<StaticConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: String,
    /// Request bodies larger than this are answered with 413.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    pub root: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_owned()
}

impl Config {
    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `EASYAPI_ADDR` if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            self.server.addr = addr;
        }
        self
    }

    /// Builds the static resolver, checking the root exists.
    pub fn static_resolver(&self) -> Result<Option<StaticAssetResolver>, Error> {
        self.static_files.as_ref()
            .map(|s| StaticAssetResolver::new(&s.root).map(|r| r.with_prefix(&s.prefix)))
            .transpose()
    }
}
