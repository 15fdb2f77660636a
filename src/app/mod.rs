//! Application layer: the list screen engine.
//!
//! This module holds everything between the runtime and the domain/api/storage
//! layers: the pure list transforms and the event-driven reducer that drives a
//! screen through its lifecycle.
//!
//! # Architecture
//!
//! The application layer follows a unidirectional data flow pattern:
//!
//! ```text
//! User Intent / Tick → Events → handle_event → State Mutations → Actions → Side Effects
//!                                   ↑                                        ↓
//!                                   └──────────── Worker Responses ──────────┘
//! ```
//!
//! # Modules
//!
//! - [`filter`]: Filter-sort engine deriving the view from the source collection
//! - [`pagination`]: Page slicing and clamping
//! - [`selection`]: Selected-id tracking across filters and pages
//! - [`bulk`]: Bulk action dispatcher and outcome aggregation
//! - [`notifications`]: Transient notification queue
//! - [`timers`]: Debounce and auto-refresh deadlines
//! - [`modes`]: Lifecycle phase and layout mode types
//! - [`state`]: Screen state container and view model computation
//! - [`handler`]: Event processing and state transitions
//! - [`actions`]: Side effect commands emitted by the handler
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::{handle_event, Event, ListState};
//! use aptdesk::domain::Resident;
//!
//! let mut state: ListState<Resident> = ListState::new(Default::default());
//! let (render, actions) = handle_event(&mut state, Event::SelectAll)?;
//! assert!(render);
//! assert!(actions.is_empty());
//! # Ok::<(), aptdesk::domain::AptdeskError>(())
//! ```

pub mod actions;
pub mod bulk;
pub mod filter;
pub mod handler;
pub mod modes;
pub mod notifications;
pub mod pagination;
pub mod selection;
pub mod state;
pub mod timers;

pub use actions::Action;
pub use bulk::{BulkAction, BulkReport, DeleteConfirmation};
pub use filter::{derive_view, FilterSpec, FilterValue, SortDirection, SortSpec, ViewStats};
pub use handler::{handle_event, Event, Restored};
pub use modes::{ViewMode, ViewPhase};
pub use notifications::{Notification, NotificationKind, NotificationQueue};
pub use pagination::{paginate, Page};
pub use selection::SelectionSet;
pub use state::{ListState, ScreenSettings};
