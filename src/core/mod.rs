//! Core data structures.
//!
//! - Refs and ref groups, the unit of cross-build reconciliation
//! - Validated plugin settings
//! - State persisted between builds
//! - Error types

pub mod errors;
pub mod refs;
pub mod settings;
pub mod state;

pub use errors::{ErrorKind, ManifestError};
pub use refs::{Group, GroupKey, Ref};
pub use settings::{ManifestKind, Settings};
pub use state::{PersistedState, OUTPUT_CACHE_KEY};
