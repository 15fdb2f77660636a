//! Platform path resolution.
//!
//! Client state, logs and downloads live under per-user platform directories
//! resolved with `dirs`. Every location can be overridden from configuration.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "aptdesk";

/// Returns the data directory for aptdesk storage.
///
/// Resolves to the platform data directory (for example
/// `~/.local/share/aptdesk` on Linux), falling back to `./.aptdesk` when the
/// platform has none.
///
/// # Examples
///
/// ```
/// use aptdesk::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert!(data_dir.ends_with("aptdesk") || data_dir.ends_with(".aptdesk"));
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".aptdesk"), |dir| dir.join(APP_DIR))
}

/// Default location of the TOML configuration file, if the platform has a
/// config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Default directory for exported files.
#[must_use]
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| get_data_dir().join("downloads"))
}

/// Client storage file inside `data_dir`.
#[must_use]
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("client-state.json")
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and all paths when no home directory is
/// known, are returned unchanged.
///
/// # Examples
///
/// ```
/// use aptdesk::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), std::path::PathBuf::from("/absolute/path"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}
