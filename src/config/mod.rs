//! Configuration for the headless session
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/postwire/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod markup;
mod serialization;


// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (maintain public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use markup::{FileMarkup, MarkupConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server that relative page paths given on the command line resolve against
    pub base_url: String,

    /// Per-request timeout for page loads and API calls
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Raw `Cookie` header value for an authenticated session (e.g. "session=...")
    pub session_cookie: Option<String>,

    /// Answer given to confirmation prompts (delete)
    pub assume_yes: bool,

    /// Selectors and labels of the page's markup contract
    pub markup: MarkupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("postwire/{}", VERSION),
            session_cookie: None,
            assume_yes: false,
            markup: MarkupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub session_cookie: Option<String>,
    pub assume_yes: Option<bool>,

    /// Optional [markup] section
    pub markup: Option<FileMarkup>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/postwire/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("postwire").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        // Write config (ignore errors - config is optional)
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// A config file that exists but cannot be parsed exits the process with
    /// an actionable message rather than falling back to defaults.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\nCONFIG ERROR - Failed to parse configuration file\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Tip: Check for:\n");
                    eprintln!("    - Missing quotes around string values");
                    eprintln!("    - Invalid boolean values (use true/false)");
                    eprintln!("    - Typos in section names\n");
                    eprintln!("  To reset, run `postwire config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\nCONFIG ERROR - Cannot read configuration file\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        Self::from_sources(Self::load_file_config(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // Base URL: env > file > default
        let base_url = env("POSTWIRE_BASE_URL")
            .or(file.base_url)
            .unwrap_or(defaults.base_url);

        // Timeout: env > file > default (unparseable env values are ignored)
        let timeout_secs = env("POSTWIRE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .or(file.timeout_secs)
            .unwrap_or(defaults.timeout_secs);

        let user_agent = file.user_agent.unwrap_or(defaults.user_agent);

        // Cookie: env > file (never defaulted)
        let session_cookie = env("POSTWIRE_COOKIE").or(file.session_cookie);

        let assume_yes = env("POSTWIRE_ASSUME_YES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .or(file.assume_yes)
            .unwrap_or(defaults.assume_yes);

        let markup = MarkupConfig::from_file(file.markup);
        let logging = LoggingConfig::from_file(file.logging, env("POSTWIRE_LOG_DIR"));

        Self {
            base_url,
            timeout_secs,
            user_agent,
            session_cookie,
            assume_yes,
            markup,
            logging,
        }
    }
}
