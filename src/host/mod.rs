//! Interfaces to the build host.
//!
//! The plugin does not own the project's targets, its deploy tree or its
//! persistent cache. It reaches them through [`TargetRegistry`] and
//! [`CacheStore`], implemented by the host. [`FsHost`] implements both on top
//! of the local filesystem.

pub mod fs;

use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value;

pub use fs::FsHost;

/// A build target known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Path of the target in the source tree
    pub source_path: String,

    /// Path the target is deployed to
    pub target_path: String,
}

impl Target {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Target {
            target_path: path.clone(),
            source_path: path,
        }
    }
}

/// The host's set of build targets and its deploy tree.
pub trait TargetRegistry {
    /// All targets of the current build, in host order.
    fn targets(&self) -> Vec<Target>;

    /// Find a target by its source path.
    fn lookup_target(&self, source_path: &str) -> Option<Target>;

    /// Deploy a target under a new name.
    fn rename_target(&mut self, target: &Target, new_name: &str) -> Result<Target>;

    /// Create an output target with the given content.
    fn create_output_target(&mut self, path: &str, content: String) -> Result<Target>;

    /// Create a target for a file read straight from the project tree.
    fn create_target_from_tree(&mut self, path: &str) -> Result<Target>;

    /// Remove a target so it is not deployed.
    fn remove_target(&mut self, target: &Target) -> Result<()>;

    /// Load a target's content.
    fn load_content(&self, target: &Target) -> Result<String>;

    /// Whether this is a development build.
    fn is_dev(&self) -> bool;

    /// Whether `output` must be regenerated because `source` changed.
    fn is_target_out_of_date(&self, source: &str, output: &str) -> Result<bool>;

    /// Record that `to` is generated from `from`.
    fn add_dependency(&mut self, from: &str, to: &str);

    /// Write pending targets to the deploy tree.
    fn commit(&mut self) -> Result<()>;

    /// Location of a deploy path on disk.
    fn deploy_path(&self, path: &str) -> PathBuf;
}

/// Persistent key/value cache kept by the host between builds.
pub trait CacheStore {
    fn read_cache_property(&self, key: &str) -> Result<Option<Value>>;

    fn write_cache_property(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Everything the plugin needs from its host.
pub trait Host: TargetRegistry + CacheStore {}

impl<T: TargetRegistry + CacheStore> Host for T {}
