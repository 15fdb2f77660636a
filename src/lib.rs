//! aptdesk: list screens for an apartment-management registry.
//!
//! aptdesk drives the household, resident and vehicle screens of a building
//! registry from the terminal:
//! - Search, filter and sort a cached collection entirely client-side
//! - Page through the result with clamped page numbers
//! - Select records across pages and run bulk status changes, deletes and exports
//! - Silently refresh in the background and surface transient notifications
//! - Remember view preferences, search history and saved filters between runs

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Runtime (runtime.rs)                               │  ← Executes actions
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling                                   │
//! │  - Filter/sort, pagination, selection, bulk         │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Storage Layer │   │ Worker Layer  │
//! │ (ui/)         │   │ (storage/)    │   │ (worker/)     │
//! │ - Rendering   │   │ - JSON store  │   │ - API calls   │
//! │ - Theming     │   │ - Preferences │   │ - Thread +    │
//! │ - Components  │   │ - History     │   │   channels    │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                                                   │
//! ┌─────────────────────────────────────────────────────┐
//! │  API (api/), Domain (domain/), Infrastructure       │
//! │  - HTTP and in-memory clients                       │
//! │  - Household, Resident, Vehicle, errors             │
//! │  - Platform paths, downloads                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! Read from `~/.config/aptdesk/config.toml` (or `--config`), then overridden
//! by `APTDESK_API_URL` and `APTDESK_TOKEN`:
//!
//! ```toml
//! api_base_url = "https://registry.example.org/api"
//! refresh_interval_secs = 30
//! search_debounce_ms = 300
//! theme = "daylight"
//! trace_level = "debug"
//! ```
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::{handle_event, Event, ListState, Restored};
//! use aptdesk::domain::Household;
//! use aptdesk::Config;
//! use chrono::Utc;
//!
//! let config = Config::default();
//! let mut state: ListState<Household> = ListState::new(config.screen_settings());
//! let (_, actions) = handle_event(
//!     &mut state,
//!     Event::Mount { now: Utc::now(), restored: Restored::default() },
//! )?;
//! assert_eq!(actions.len(), 1); // the initial fetch
//! # Ok::<(), aptdesk::AptdeskError>(())
//! ```

pub mod api;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod runtime;
pub mod storage;
pub mod ui;
pub mod worker;

pub use app::{handle_event, Action, Event, ListState, ScreenSettings, ViewMode, ViewPhase};
pub use domain::{AptdeskError, Entity, EntityKind, Household, Resident, Result, Vehicle};
pub use runtime::ScreenRuntime;
pub use ui::Theme;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`Config::api_base_url`].
pub const ENV_API_URL: &str = "APTDESK_API_URL";

/// Environment variable overriding [`Config::token`].
pub const ENV_TOKEN: &str = "APTDESK_TOKEN";

/// Client configuration.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the registry API, e.g. `https://host/api`.
    pub api_base_url: String,

    /// Bearer token sent with every request.
    pub token: Option<String>,

    /// Directory for the client state file and trace log.
    ///
    /// Default: the platform data directory joined with `aptdesk`.
    pub data_dir: Option<PathBuf>,

    /// Directory exports are written to. Default: the platform download directory.
    pub download_dir: Option<PathBuf>,

    /// Silent refresh period in seconds; `0` disables it. Default: 30
    pub refresh_interval_secs: u64,

    /// Delay between the last keystroke and the search being applied. Default: 300
    pub search_debounce_ms: u64,

    /// Lifetime of ordinary notifications. Default: 5000
    pub notification_ttl_ms: u64,

    /// Per-request timeout in seconds. Default: 30
    pub request_timeout_secs: u64,

    /// Built-in theme name (`midnight`, `daylight`). Ignored if `theme_file` is set.
    #[serde(rename = "theme")]
    pub theme_name: Option<String>,

    /// Path to a custom TOML theme. Takes precedence over `theme_name`.
    pub theme_file: Option<String>,

    /// Filter directive for tracing, e.g. `debug` or `aptdesk::worker=trace`.
    ///
    /// `RUST_LOG` wins when set. Default: `"info"`
    pub trace_level: Option<String>,

    /// Also print log events to stderr.
    pub log_to_stderr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            token: None,
            data_dir: None,
            download_dir: None,
            refresh_interval_secs: 30,
            search_debounce_ms: 300,
            notification_ttl_ms: 5_000,
            request_timeout_secs: 30,
            theme_name: None,
            theme_file: None,
            trace_level: None,
            log_to_stderr: false,
        }
    }
}

impl Config {
    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AptdeskError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&contents)
            .map_err(|e| AptdeskError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Builds a configuration from flat `key = value` pairs.
    ///
    /// Numeric values that fail to parse keep their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use aptdesk::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("refresh_interval_secs".to_string(), "0".to_string());
    /// map.insert("theme".to_string(), "daylight".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.refresh_interval_secs, 0);
    /// assert_eq!(config.theme_name.as_deref(), Some("daylight"));
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str, default: u64| {
            map.get(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let text = |key: &str| {
            map.get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            api_base_url: text("api_base_url").unwrap_or(defaults.api_base_url),
            token: text("token"),
            data_dir: text("data_dir").map(|s| infrastructure::expand_tilde(&s)),
            download_dir: text("download_dir").map(|s| infrastructure::expand_tilde(&s)),
            refresh_interval_secs: number("refresh_interval_secs", defaults.refresh_interval_secs),
            search_debounce_ms: number("search_debounce_ms", defaults.search_debounce_ms),
            notification_ttl_ms: number("notification_ttl_ms", defaults.notification_ttl_ms),
            request_timeout_secs: number("request_timeout_secs", defaults.request_timeout_secs),
            theme_name: text("theme"),
            theme_file: text("theme_file"),
            trace_level: text("trace_level"),
            log_to_stderr: text("log_to_stderr").is_some_and(|s| s == "true" || s == "1"),
        }
    }

    /// Applies overrides from a variable lookup.
    ///
    /// Takes the lookup as a function so the real environment stays out of tests.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|s| !s.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|s| !s.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Timing settings handed to every screen.
    #[must_use]
    pub const fn screen_settings(&self) -> ScreenSettings {
        ScreenSettings {
            refresh_interval_ms: self.refresh_interval_secs.saturating_mul(1_000),
            search_debounce_ms: self.search_debounce_ms,
            notification_ttl_ms: self.notification_ttl_ms,
        }
    }

    /// Resolved data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(infrastructure::get_data_dir)
    }

    /// Resolved download directory.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(infrastructure::default_download_dir)
    }
}

/// Loads the configured theme.
///
/// Falls back to the default theme (with a debug log) when the file or name
/// cannot be resolved.
pub fn initialize(config: &Config) -> Theme {
    tracing::debug!("initializing aptdesk");

    config.theme_file.as_ref().map_or_else(
        || {
            config.theme_name.as_ref().map_or_else(Theme::default, |theme_name| {
                Theme::from_name(theme_name).unwrap_or_else(|| {
                    tracing::debug!(theme_name = %theme_name, "unknown theme, using default");
                    Theme::default()
                })
            })
        },
        |theme_file| {
            Theme::from_file(infrastructure::expand_tilde(theme_file)).unwrap_or_else(|e| {
                tracing::debug!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
                Theme::default()
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_base_url = \"https://registry.test/api\"\nrefresh_interval_secs = 0\ntheme = \"daylight\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://registry.test/api");
        assert_eq!(config.screen_settings().refresh_interval_ms, 0);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(initialize(&config).name, "daylight");
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval_secs = \"soon\"").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(AptdeskError::Config(_))
        ));
    }

    #[test]
    fn map_ignores_unparseable_numbers() {
        let mut map = BTreeMap::new();
        map.insert("search_debounce_ms".to_string(), "fast".to_string());
        map.insert("token".to_string(), "  ".to_string());
        let config = Config::from_map(&map);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.token, None);
    }

    #[test]
    fn environment_overrides_url_and_token() {
        let config = Config::default().with_env(|key| match key {
            ENV_API_URL => Some("https://other/api".to_string()),
            ENV_TOKEN => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://other/api");
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let config = Config {
            theme_name: Some("neon".to_string()),
            ..Default::default()
        };
        assert_eq!(initialize(&config), Theme::default());
    }
}
