//! View-state machine and presentation mode types.
//!
//! # State Machine
//!
//! ```text
//!            Mount            ListLoaded
//!   Idle ──────────► Loading ───────────► Ready ◄──────────┐
//!                       ▲                  │  │            │
//!                 Retry │      RunBulk     │  │ Tick       │ done
//!                       │    ┌─────────────┘  └───────┐    │
//!                       │    ▼                        ▼    │
//!                     Error ◄── Mutating      Refreshing ──┘
//!                       ▲          │                │
//!                       └──────────┴── failure ─────┘
//! ```
//!
//! Filter, sort, page and selection changes keep the screen in `Ready`.
//! Only an explicit retry leaves `Error`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::AptdeskError;

/// Lifecycle phase of one list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewPhase {
    /// Not mounted yet (or unmounted).
    #[default]
    Idle,
    /// Initial fetch (or retry) in flight, nothing to show yet.
    Loading,
    /// Collection cached and interactive.
    Ready,
    /// A bulk action is running.
    Mutating,
    /// Silent background refetch while the cached view stays interactive.
    Refreshing,
    /// A request failed; waiting for an explicit retry.
    Error,
}

impl ViewPhase {
    /// Whether a network request for this screen is outstanding.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Mutating | Self::Refreshing)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Mutating => "saving",
            Self::Refreshing => "refreshing",
            Self::Error => "error",
        }
    }
}

/// How rows are laid out on screen. Persisted in preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// One line per record with aligned columns.
    #[default]
    Table,
    /// Two lines per record: name, then details.
    Card,
    /// Compact names packed several per line.
    Grid,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Card => "card",
            Self::Grid => "grid",
        })
    }
}

impl FromStr for ViewMode {
    type Err = AptdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" | "list" => Ok(Self::Table),
            "card" | "cards" => Ok(Self::Card),
            "grid" => Ok(Self::Grid),
            other => Err(AptdeskError::Validation(format!("unknown view mode: {other}"))),
        }
    }
}
