//! Configuration module for robot-mock.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values. With neither,
//! the defaults reproduce the fixed fixture: `0.0.0.0:10100`, 1024-byte reads.

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Port the robot controller's TCS server listens on.
pub const DEFAULT_PORT: u16 = 10100;

/// Command-line arguments for the mock server
#[derive(Parser, Debug)]
#[command(name = "robot-mock")]
#[command(version = "0.1.0")]
#[command(about = "Single-connection TCP test double for robot clients", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:10100)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Wire protocol to emulate
    #[arg(short = 'p', long, value_enum)]
    pub protocol: Option<ProtocolType>,

    /// What to do when a read returns zero bytes
    #[arg(long, value_enum)]
    pub empty_read: Option<EmptyReadPolicy>,

    /// Maximum bytes taken from the socket per read
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Protocol spoken on the accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    /// Marker-substring echo protocol (`exit`, `fail_me`).
    Marker,
    /// Line-based TCS robot command emulator.
    Tcs,
}

/// Handling of a zero-length read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmptyReadPolicy {
    /// Treat it as the peer closing the transport and end the session.
    Close,
    /// Keep reading, as the legacy fixture did.
    Retry,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tcs: TcsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Read buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_protocol")]
    pub protocol: ProtocolType,
    #[serde(default = "default_empty_read")]
    pub empty_read: EmptyReadPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            buffer_size: default_buffer_size(),
            protocol: default_protocol(),
            empty_read: default_empty_read(),
        }
    }
}

/// TCS emulator configuration
#[derive(Debug, Deserialize)]
pub struct TcsConfig {
    /// Delay before answering `waitForEOM`, in milliseconds
    #[serde(default = "default_eom_delay_ms")]
    pub eom_delay_ms: u64,
}

impl Default for TcsConfig {
    fn default() -> Self {
        Self {
            eom_delay_ms: default_eom_delay_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_buffer_size() -> usize {
    1024
}

fn default_protocol() -> ProtocolType {
    ProtocolType::Marker
}

fn default_empty_read() -> EmptyReadPolicy {
    EmptyReadPolicy::Close
}

fn default_eom_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub buffer_size: usize,
    pub protocol: ProtocolType,
    pub empty_read: EmptyReadPolicy,
    pub eom_delay: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let server = ServerConfig::default();
        Config {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            buffer_size: server.buffer_size,
            protocol: server.protocol,
            empty_read: server.empty_read,
            eom_delay: Duration::from_millis(default_eom_delay_ms()),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::resolve(cli, toml_config)
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    fn resolve(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let listen = cli.listen.unwrap_or(toml_config.server.listen);
        let listen = listen
            .parse()
            .map_err(|e| ConfigError::InvalidListen(listen.clone(), e))?;

        let buffer_size = cli.buffer_size.unwrap_or(toml_config.server.buffer_size);
        if buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }

        Ok(Config {
            listen,
            buffer_size,
            protocol: cli.protocol.unwrap_or(toml_config.server.protocol),
            empty_read: cli.empty_read.unwrap_or(toml_config.server.empty_read),
            eom_delay: Duration::from_millis(toml_config.tcs.eom_delay_ms),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:10100");
        assert_eq!(config.server.buffer_size, 1024);
        assert_eq!(config.server.protocol, ProtocolType::Marker);
        assert_eq!(config.server.empty_read, EmptyReadPolicy::Close);
        assert_eq!(config.tcs.eom_delay_ms, 500);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "127.0.0.1:20200"
            buffer_size = 64
            protocol = "tcs"
            empty_read = "retry"

            [tcs]
            eom_delay_ms = 5

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:20200");
        assert_eq!(config.server.buffer_size, 64);
        assert_eq!(config.server.protocol, ProtocolType::Tcs);
        assert_eq!(config.server.empty_read, EmptyReadPolicy::Retry);
        assert_eq!(config.tcs.eom_delay_ms, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = CliArgs::parse_from([
            "robot-mock",
            "--listen",
            "127.0.0.1:0",
            "--empty-read",
            "retry",
            "--log-level",
            "trace",
        ]);
        let file: TomlConfig = toml::from_str("[server]\nlisten = \"10.0.0.1:1\"\nbuffer_size = 8").unwrap();

        let config = Config::resolve(cli, file).unwrap();
        assert_eq!(config.listen, "127.0.0.1:0".parse().unwrap());
        assert_eq!(config.buffer_size, 8);
        assert_eq!(config.empty_read, EmptyReadPolicy::Retry);
        assert_eq!(config.protocol, ProtocolType::Marker);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_defaults_match_fixture() {
        let config = Config::default();
        assert_eq!(config.listen, "0.0.0.0:10100".parse().unwrap());
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.eom_delay, Duration::from_millis(500));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_explicit_info_overrides_file_level() {
        let cli = CliArgs::parse_from(["robot-mock", "--log-level", "info"]);
        let file: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(Config::resolve(cli, file).unwrap().log_level, "info");

        let cli = CliArgs::parse_from(["robot-mock"]);
        let file: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(Config::resolve(cli, file).unwrap().log_level, "debug");
    }

    #[test]
    fn test_invalid_listen_rejected() {
        let cli = CliArgs::parse_from(["robot-mock", "--listen", "not-an-address"]);
        match Config::resolve(cli, TomlConfig::default()) {
            Err(ConfigError::InvalidListen(addr, _)) => assert_eq!(addr, "not-an-address"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let cli = CliArgs::parse_from(["robot-mock", "--buffer-size", "0"]);
        assert!(matches!(
            Config::resolve(cli, TomlConfig::default()),
            Err(ConfigError::ZeroBufferSize)
        ));
    }
}
