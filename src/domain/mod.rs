//! Domain layer for aptdesk.
//!
//! This module contains the registry records and the capability trait the list
//! engine is written against, independent of HTTP, storage or rendering
//! concerns.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`entity`]: The [`Entity`] trait, ids, field values and references
//! - [`household`], [`resident`], [`vehicle`]: Concrete registry records
//! - [`export`]: Export formats and generated filenames
//!
//! # Examples
//!
//! ```
//! use aptdesk::domain::{Entity, EntityKind, Household, Result};
//!
//! fn parse(json: &str) -> Result<Vec<Household>> {
//!     Ok(serde_json::from_str(json)?)
//! }
//!
//! let households = parse(r#"[{"_id":"h1","apartmentNumber":"A-101"}]"#).unwrap();
//! assert_eq!(households[0].display_name(), "A-101");
//! assert_eq!(Household::KIND, EntityKind::Household);
//! ```

pub mod entity;
pub mod error;
pub mod export;
pub mod household;
pub mod resident;
pub mod vehicle;

pub use entity::{
    parse_datetime, Entity, EntityId, EntityKind, FieldContext, FieldValue, FilterKind, Reference,
};
pub use error::{AptdeskError, Result};
pub use export::{ExportFile, ExportFormat};
pub use household::Household;
pub use resident::Resident;
pub use vehicle::Vehicle;
