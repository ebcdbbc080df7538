//! Test utilities and mocks for unit tests.
//!
//! [`MockHost`] is an in-memory build host: targets, tree files, output
//! targets and cache properties live in maps, while committed targets are
//! written into a temporary deploy directory so stale-file deletion can be
//! observed on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut host = MockHost::new();
//! host.add_target("dist/app.js", "console.log(1)");
//! host.add_tree_file("tpl/index.html", "<html></html>");
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::host::{CacheStore, Target, TargetRegistry};
use crate::util::fs::{root_relative, write_string};

/// In-memory build host.
#[derive(Debug)]
pub struct MockHost {
    targets: Vec<Target>,
    contents: HashMap<String, String>,
    tree: HashMap<String, String>,
    outputs: HashMap<String, String>,
    cache: HashMap<String, Value>,
    dependencies: Vec<(String, String)>,
    out_of_date: HashSet<String>,
    dev: bool,
    deploy: TempDir,
}

impl Default for MockHost {
    fn default() -> Self {
        MockHost::new()
    }
}

impl MockHost {
    /// Create an empty host with a fresh deploy directory.
    pub fn new() -> Self {
        MockHost {
            targets: Vec::new(),
            contents: HashMap::new(),
            tree: HashMap::new(),
            outputs: HashMap::new(),
            cache: HashMap::new(),
            dependencies: Vec::new(),
            out_of_date: HashSet::new(),
            dev: false,
            deploy: TempDir::new().expect("failed to create deploy dir"),
        }
    }

    /// Add a build target with the given content.
    pub fn add_target(&mut self, path: &str, content: &str) {
        self.targets.push(Target::new(path));
        self.contents.insert(path.to_string(), content.to_string());
    }

    /// Add a file to the project tree that is not a build target.
    pub fn add_tree_file(&mut self, path: &str, content: &str) {
        self.tree.insert(path.to_string(), content.to_string());
    }

    /// Mark a source as changed since `output` was written.
    pub fn mark_out_of_date(&mut self, source: &str) {
        self.out_of_date.insert(source.to_string());
    }

    pub fn set_dev(&mut self, dev: bool) {
        self.dev = dev;
    }

    /// Start a new build: targets get their source names back and output
    /// targets are dropped. The cache and the deploy directory persist.
    pub fn next_build(&mut self) {
        for target in &mut self.targets {
            target.target_path = target.source_path.clone();
        }
        self.outputs.clear();
        self.dependencies.clear();
    }

    /// Content of an output target created during this build.
    pub fn output(&self, path: &str) -> Option<&str> {
        self.outputs.get(path).map(String::as_str)
    }

    pub fn cache_property(&self, key: &str) -> Option<&Value> {
        self.cache.get(key)
    }

    pub fn set_cache_property(&mut self, key: &str, value: Value) {
        self.cache.insert(key.to_string(), value);
    }

    pub fn dependencies(&self) -> &[(String, String)] {
        &self.dependencies
    }

    /// Check whether a deploy path exists on disk.
    pub fn deployed(&self, path: &str) -> bool {
        self.deploy_path(path).exists()
    }
}

impl TargetRegistry for MockHost {
    fn targets(&self) -> Vec<Target> {
        self.targets.clone()
    }

    fn lookup_target(&self, source_path: &str) -> Option<Target> {
        let source_path = root_relative(source_path);
        self.targets
            .iter()
            .find(|t| t.source_path == source_path)
            .cloned()
    }

    fn rename_target(&mut self, target: &Target, new_name: &str) -> Result<Target> {
        let found = self
            .targets
            .iter_mut()
            .find(|t| t.source_path == target.source_path)
            .ok_or_else(|| anyhow!("unknown target: {}", target.source_path))?;
        found.target_path = new_name.to_string();
        Ok(found.clone())
    }

    fn create_output_target(&mut self, path: &str, content: String) -> Result<Target> {
        self.outputs.insert(path.to_string(), content);
        Ok(Target::new(path))
    }

    fn create_target_from_tree(&mut self, path: &str) -> Result<Target> {
        let content = self
            .tree
            .get(path)
            .ok_or_else(|| anyhow!("file not found: {}", path))?;
        self.contents.insert(path.to_string(), content.clone());
        Ok(Target::new(path))
    }

    fn remove_target(&mut self, target: &Target) -> Result<()> {
        self.targets.retain(|t| t.source_path != target.source_path);
        Ok(())
    }

    fn load_content(&self, target: &Target) -> Result<String> {
        self.contents
            .get(&target.source_path)
            .cloned()
            .ok_or_else(|| anyhow!("no content for target: {}", target.source_path))
    }

    fn is_dev(&self) -> bool {
        self.dev
    }

    fn is_target_out_of_date(&self, source: &str, _output: &str) -> Result<bool> {
        Ok(self.out_of_date.contains(source))
    }

    fn add_dependency(&mut self, from: &str, to: &str) {
        self.dependencies.push((from.to_string(), to.to_string()));
    }

    fn commit(&mut self) -> Result<()> {
        for target in &self.targets {
            let content = self.contents.get(&target.source_path).cloned().unwrap_or_default();
            write_string(&self.deploy_path(&target.target_path), &content)?;
        }
        for (path, content) in &self.outputs {
            write_string(&self.deploy_path(path), content)?;
        }
        Ok(())
    }

    fn deploy_path(&self, path: &str) -> PathBuf {
        self.deploy.path().join(root_relative(path))
    }
}

impl CacheStore for MockHost {
    fn read_cache_property(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.get(key).cloned())
    }

    fn write_cache_property(&mut self, key: &str, value: Value) -> Result<()> {
        self.cache.insert(key.to_string(), value);
        Ok(())
    }
}
