//! Configuration for the gateway
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/imwallet-proxy/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Log Rotation
// ─────────────────────────────────────────────────────────────────────────────

/// Log file rotation strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogRotation {
    /// Rotate log files hourly
    Hourly,
    /// Rotate log files daily (default)
    #[default]
    Daily,
    /// Never rotate - single log file
    Never,
}

impl LogRotation {
    /// Parse rotation string from config
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "daily" => Self::Daily,
            "never" => Self::Never,
            _ => Self::Daily, // Default to daily for unknown values
        }
    }

    /// Convert to string for TOML serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Enable file logging (in addition to stdout)
    pub file_enabled: bool,
    /// Directory for log files
    pub file_dir: PathBuf,
    /// Log file rotation strategy
    pub file_rotation: LogRotation,
    /// Prefix for log file names (e.g., "gateway" -> "gateway.2026-01-15.log")
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false, // Opt-in feature
            file_dir: PathBuf::from("./logs"),
            file_rotation: LogRotation::Daily,
            file_prefix: "gateway".to_string(),
        }
    }
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_rotation: file
                .file_rotation
                .map(|s| LogRotation::from_str(&s))
                .unwrap_or(defaults.file_rotation),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
///
/// Built once at startup and shared immutably with every handler.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the gateway listens on
    pub port: u16,

    /// Shared secret clients must present in the X-Proxy-Secret header
    pub secret: String,

    /// Public base URL of this deployment, pinged by the keep-alive task
    pub external_url: String,

    /// Value sent back in Access-Control-Allow-Origin
    pub cors_origin: String,

    /// Whether the keep-alive self-ping task runs
    pub keep_alive: bool,

    /// Upstream origin every relayed request goes to
    pub upstream_base: String,

    /// Total budget for one outbound request (connect through body)
    pub upstream_timeout: Duration,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            secret: "biq_imw_proxy_2026".to_string(),
            external_url: "http://localhost:3000".to_string(),
            cors_origin: "*".to_string(),
            keep_alive: true,
            upstream_base: "https://partner.imwallet.in".to_string(),
            upstream_timeout: Duration::from_secs(30),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
///
/// The upstream origin and timeout are deliberately absent: the gateway
/// relays to exactly one partner API and nothing else.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub port: Option<u16>,
    pub secret: Option<String>,
    pub external_url: Option<String>,
    pub cors_origin: Option<String>,
    pub keep_alive: Option<bool>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/imwallet-proxy/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| {
            p.join(".config")
                .join("imwallet-proxy")
                .join("config.toml")
        })
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        // Use Config::default().to_toml() as single source of truth
        let template = Self::default().to_toml();

        // Write config (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    ///
    /// # Panics
    /// If config file exists but cannot be parsed. This is intentional -
    /// a broken config should fail fast with a clear error, not silently
    /// fall back to defaults while the user debugs the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                match toml::from_str(&contents) {
                    Ok(config) => config,
                    Err(e) => {
                        // Fatal error - config exists but is invalid
                        eprintln!(
                            "\n╔══════════════════════════════════════════════════════════════╗"
                        );
                        eprintln!(
                            "║  CONFIG ERROR - Failed to parse configuration file          ║"
                        );
                        eprintln!(
                            "╚══════════════════════════════════════════════════════════════╝\n"
                        );
                        eprintln!("  File: {}\n", path.display());
                        eprintln!("  Error: {}\n", e);
                        eprintln!("  Tip: Check for:\n");
                        eprintln!("    - Missing quotes around string values");
                        eprintln!("    - Invalid boolean values (use true/false)");
                        eprintln!("    - Typos in section names\n");
                        eprintln!("  To reset, run: imwallet-proxy config --reset\n");
                        std::process::exit(1);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Config file doesn't exist - use defaults
                FileConfig::default()
            }
            Err(e) => {
                // File exists but can't be read (permissions, etc.)
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Cannot read configuration file              ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Listen port: env > file > default (PORT is what Render and friends inject)
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.port)
            .unwrap_or(3000);

        // Shared secret: env > file > default
        let secret = std::env::var("PROXY_SECRET")
            .ok()
            .or(file.secret)
            .unwrap_or_else(|| "biq_imw_proxy_2026".to_string());

        // Self-ping base URL: env > file > local fallback
        let external_url = std::env::var("RENDER_EXTERNAL_URL")
            .ok()
            .or(file.external_url)
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        // CORS origin: file > default (wildcard)
        let cors_origin = file.cors_origin.unwrap_or_else(|| "*".to_string());

        // Keep-alive toggle: file > default
        let keep_alive = file.keep_alive.unwrap_or(true);

        let logging = LoggingConfig::from_file(file.logging);

        Self {
            port,
            secret,
            external_url,
            cors_origin,
            keep_alive,
            upstream_base: "https://partner.imwallet.in".to_string(),
            upstream_timeout: Duration::from_secs(30),
            logging,
        }
    }

    /// First 16 hex chars of the secret's SHA-256. Safe to log; the raw
    /// secret never is.
    pub fn secret_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        let hash = hasher.finalize();
        format!("{:x}", hash)[..16].to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialization
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Serialize to TOML. Single source of truth for the config file format.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# imwallet-proxy configuration

# Port the gateway listens on (PORT env var overrides)
port = {port}

# Shared secret clients must send in the X-Proxy-Secret header
# (PROXY_SECRET env var overrides)
secret = "{secret}"

# Public base URL of this deployment, pinged by the keep-alive task
# (RENDER_EXTERNAL_URL env var overrides)
external_url = "{external_url}"

# Access-Control-Allow-Origin value: "*" or one fixed origin
cors_origin = "{cors_origin}"

# Self-ping <external_url>/health every 10 minutes so free-tier hosts
# don't idle the process
keep_alive = {keep_alive}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# File logging (in addition to stdout)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            port = self.port,
            secret = self.secret,
            external_url = self.external_url,
            cors_origin = self.cors_origin,
            keep_alive = self.keep_alive,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
