//! deploy-manifest - build-output manifests with cross-build reconciliation
//!
//! This crate generates a manifest enumerating the deployed paths of a build,
//! busts cache-sensitive filenames, and reconciles each build's tracked
//! output with the previous build so stale generated files get deleted.

pub mod builder;
pub mod core;
pub mod host;
pub mod manifest;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory build host.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    errors::ManifestError, refs::Group, refs::GroupKey, refs::Ref, settings::Settings,
    state::PersistedState,
};
pub use host::{CacheStore, FsHost, Host, Target, TargetRegistry};
pub use ops::ManifestPlugin;
