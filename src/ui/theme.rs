//! Color themes and ANSI escape sequence generation.
//!
//! Themes are TOML documents. Two are built in (`midnight`, the default, and
//! `daylight`); custom ones are loaded with [`Theme::from_file`].
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#cdd6f4"
//! selection_fg = "#1e1e2e"
//! selection_bg = "#89b4fa"
//! text_normal = "#cdd6f4"
//! text_dim = "#6c7086"
//! border = "#45475a"
//! search_bar_border = "#89b4fa"
//! match_highlight_fg = "#1e1e2e"
//! match_highlight_bg = "#f9e2af"
//! empty_state_fg = "#89b4fa"
//! active_fg = "#a6e3a1"
//! inactive_fg = "#f38ba8"
//! success_fg = "#a6e3a1"
//! error_fg = "#f38ba8"
//! warning_fg = "#fab387"
//! info_fg = "#89dceb"
//! ```
//!
//! # Example
//!
//! ```rust
//! use aptdesk::ui::Theme;
//!
//! let theme = Theme::from_name("daylight").unwrap();
//! let line = format!("{}Bold{}", Theme::bold(), Theme::reset());
//! assert!(line.starts_with("\u{1b}[1m"));
//! assert_eq!(theme.name, "daylight");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::app::NotificationKind;
use crate::domain::{AptdeskError, Result};

/// A named color scheme.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// Hex colors (`"#rrggbb"`) for every styled element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,

    /// Rows in the selection set.
    pub selection_fg: String,
    pub selection_bg: String,

    pub text_normal: String,
    /// Footer, details and other secondary text.
    pub text_dim: String,

    pub border: String,
    pub search_bar_border: String,

    /// Characters matched by the search term.
    pub match_highlight_fg: String,
    pub match_highlight_bg: String,

    pub empty_state_fg: String,

    /// Status dot for active and inactive records.
    pub active_fg: String,
    pub inactive_fg: String,

    pub success_fg: String,
    pub error_fg: String,
    pub warning_fg: String,
    pub info_fg: String,
}

impl ThemeColors {
    /// Color for a notification of `kind`.
    #[must_use]
    pub fn notification(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::Success => &self.success_fg,
            NotificationKind::Error => &self.error_fg,
            NotificationKind::Warning => &self.warning_fg,
            NotificationKind::Info => &self.info_fg,
        }
    }
}

impl Theme {
    /// Names accepted by [`Theme::from_name`].
    pub const BUILT_IN: &'static [&'static str] = &["midnight", "daylight"];

    /// Loads a built-in theme by name.
    ///
    /// Returns `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "midnight" => include_str!("../../themes/midnight.toml"),
            "daylight" => include_str!("../../themes/daylight.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Theme`] if the file cannot be read or is not a
    /// valid theme document.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            AptdeskError::Theme(format!(
                "failed to read theme file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        toml::from_str(&contents)
            .map_err(|e| AptdeskError::Theme(format!("failed to parse theme TOML: {e}")))
    }

    /// Parses `#rrggbb`; anything malformed renders as white.
    fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
        let hex = hex.trim().trim_start_matches('#');

        if hex.len() != 6 || !hex.is_ascii() {
            return (255, 255, 255);
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap_or(255);
        (channel(0..2), channel(2..4), channel(4..6))
    }

    /// 24-bit foreground escape (`\x1b[38;2;r;g;bm`).
    #[must_use]
    pub fn fg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[38;2;{r};{g};{b}m")
    }

    /// 24-bit background escape (`\x1b[48;2;r;g;bm`).
    #[must_use]
    pub fn bg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[48;2;{r};{g};{b}m")
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{001b}[1m"
    }

    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{001b}[2m"
    }

    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{001b}[0m"
    }
}

impl Default for Theme {
    /// The `midnight` palette.
    fn default() -> Self {
        Self {
            name: "midnight".to_string(),
            colors: ThemeColors {
                header_fg: "#cdd6f4".to_string(),
                header_bg: None,
                selection_fg: "#1e1e2e".to_string(),
                selection_bg: "#89b4fa".to_string(),
                text_normal: "#cdd6f4".to_string(),
                text_dim: "#6c7086".to_string(),
                border: "#45475a".to_string(),
                search_bar_border: "#89b4fa".to_string(),
                match_highlight_fg: "#1e1e2e".to_string(),
                match_highlight_bg: "#f9e2af".to_string(),
                empty_state_fg: "#89b4fa".to_string(),
                active_fg: "#a6e3a1".to_string(),
                inactive_fg: "#f38ba8".to_string(),
                success_fg: "#a6e3a1".to_string(),
                error_fg: "#f38ba8".to_string(),
                warning_fg: "#fab387".to_string(),
                info_fg: "#89dceb".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_themes_parse() {
        for name in Theme::BUILT_IN {
            let theme = Theme::from_name(name).unwrap();
            assert_eq!(theme.name, *name);
        }
        assert!(Theme::from_name("solarized").is_none());
    }

    #[test]
    fn default_matches_midnight_file() {
        assert_eq!(Theme::from_name("midnight").unwrap(), Theme::default());
    }

    #[test]
    fn escapes_encode_rgb() {
        assert_eq!(Theme::fg("#ff0080"), "\u{1b}[38;2;255;0;128m");
        assert_eq!(Theme::bg("zz"), "\u{1b}[48;2;255;255;255m");
    }

    #[test]
    fn custom_theme_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = include_str!("../../themes/daylight.toml").replace("daylight", "custom");
        file.write_all(body.as_bytes()).unwrap();

        let theme = Theme::from_file(file.path()).unwrap();
        assert_eq!(theme.name, "custom");
        assert_eq!(theme.colors.header_bg.as_deref(), Some("#e6e9ef"));
    }

    #[test]
    fn invalid_theme_file_is_theme_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"name = 3").unwrap();
        assert!(matches!(
            Theme::from_file(file.path()),
            Err(AptdeskError::Theme(_))
        ));
    }
}
