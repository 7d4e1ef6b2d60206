//! Error types for startup and configuration.
//!
//! Session-level I/O faults are not errors here: they end the session with
//! [`CloseReason::Fault`](crate::session::CloseReason) and are only logged.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    TomlParse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid listen address '{0}': {1}")]
    InvalidListen(String, #[source] AddrParseError),

    #[error("Buffer size must be greater than zero")]
    ZeroBufferSize,
}

/// Fatal responder errors. Every variant aborts startup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}
