//! Infrastructure layer for filesystem and environment interactions.
//!
//! Platform directory resolution and writing exported files.

pub mod downloads;
pub mod paths;

pub use downloads::write_download;
pub use paths::{default_config_path, default_download_dir, expand_tilde, get_data_dir, store_path};
