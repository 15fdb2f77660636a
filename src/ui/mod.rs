//! Terminal rendering.
//!
//! ```text
//! ListState → compute_viewmodel → UIViewModel → render → String (ANSI or plain)
//! ```
//!
//! - [`viewmodel`]: Display-ready data computed from a screen
//! - [`renderer`]: Frame assembly entry points
//! - `components`: Header, search box, rows, status lines and footer
//! - [`helpers`]: The [`Canvas`](helpers::Canvas) buffer and match highlighting
//! - [`theme`]: Color schemes loaded from TOML

mod components;
pub mod helpers;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use renderer::{render, render_viewmodel};
pub use theme::{Theme, ThemeColors};
pub use viewmodel::{
    BulkBarInfo, DisplayItem, EmptyState, FooterInfo, HeaderInfo, NotificationItem,
    SearchBarInfo, StatsInfo, UIViewModel,
};
