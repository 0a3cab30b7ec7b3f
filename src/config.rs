//! Configuration module for telnetc.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::telnet::WindowSize;
use clap::Parser;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Standard TELNET port.
pub const DEFAULT_PORT: u16 = 23;

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "telnetc")]
#[command(author = "telnetc authors")]
#[command(version = "0.1.0")]
#[command(about = "A minimal interactive TELNET client", long_about = None)]
#[command(override_usage = "telnetc address [port]")]
pub struct CliArgs {
    /// Host name or IP address of the server
    pub address: String,

    /// Port to connect to (default 23)
    #[arg(allow_negative_numbers = true)]
    pub port: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Connect timeout per candidate address, in seconds
    #[arg(short = 't', long)]
    pub connect_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Port used when none is given on the command line
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect timeout per candidate address in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Readiness-wait timeout in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_secs: None,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Window size reported to servers that ask for it
#[derive(Debug, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
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

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_poll_interval() -> u64 {
    1000 // 1 second
}

fn default_width() -> u16 {
    WindowSize::default().width
}

fn default_height() -> u16 {
    WindowSize::default().height
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub window: WindowSize,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::args_os())
    }

    /// Load configuration from an explicit argument list.
    /// CLI arguments take precedence over TOML file values.
    pub fn load_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = CliArgs::try_parse_from(args).map_err(ConfigError::Usage)?;

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        validate(&toml_config)?;
        Ok(Self::merge(cli, toml_config))
    }

    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        Config {
            host: cli.address,
            port: cli
                .port
                .as_deref()
                .map(parse_port)
                .unwrap_or(toml_config.connection.port),
            connect_timeout: cli
                .connect_timeout
                .or(toml_config.connection.connect_timeout_secs)
                .map(Duration::from_secs),
            poll_interval: Duration::from_millis(toml_config.connection.poll_interval_ms),
            window: WindowSize {
                width: toml_config.terminal.width,
                height: toml_config.terminal.height,
            },
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        }
    }
}

/// Reject values that would make the session misbehave.
fn validate(toml_config: &TomlConfig) -> Result<(), ConfigError> {
    // A zero wait turns the idle loop into a busy spin
    if toml_config.connection.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "connection.poll_interval_ms",
            "must be at least 1",
        ));
    }
    Ok(())
}

/// Lenient port parsing: leading whitespace, optional sign, then leading
/// digits. Anything else, or a value outside the port range, yields 0.
pub fn parse_port(s: &str) -> u16 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<u32>() {
        Ok(0) => 0,
        Ok(_) if negative => 0,
        Ok(n) => u16::try_from(n).unwrap_or(0),
        Err(_) => 0,
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Usage(clap::Error),
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(&'static str, &'static str),
}

impl ConfigError {
    /// `--help` and `--version` surface as clap errors but are not failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, ConfigError::Usage(e) if !e.use_stderr())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Usage(e) if !e.use_stderr() => write!(f, "{e}"),
            ConfigError::Usage(_) => write!(f, "Usage: telnetc address [port]"),
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(key, reason) => write!(f, "Invalid config value '{key}': {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
