//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by easyapi's fallible operations.
///
/// Application-level failures (404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values and never surface here. This type
/// covers the configuration phase and the transport: a bad static root, an
/// unreadable config file, a listener that cannot bind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("static folder `{}` is misconfigured: {reason}", path.display())]
    StaticFolderMisconfigured { path: PathBuf, reason: String },

    #[error("cannot read config `{}`: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("unsupported {service} provider `{name}`")]
    UnsupportedProvider { service: &'static str, name: String },
}
