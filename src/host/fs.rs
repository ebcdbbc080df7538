//! Filesystem-backed build host.
//!
//! Every file below the project root is a build target. Committing copies
//! targets (under their possibly busted names) and output targets into the
//! deploy directory. Cache properties are kept in
//! `<root>/.deploy-manifest/cache.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

use crate::host::{CacheStore, Target, TargetRegistry};
use crate::util::fs::{ensure_dir, read_to_string, root_relative, walk_files, write_string};

/// Directory below the project root holding host state.
pub const CACHE_DIR: &str = ".deploy-manifest";

const CACHE_FILE: &str = "cache.json";

/// A build host over a project directory and a deploy directory.
#[derive(Debug)]
pub struct FsHost {
    root: PathBuf,
    deploy: PathBuf,
    dev: bool,
    targets: Vec<Target>,
    outputs: Vec<(String, String)>,
    dependencies: Vec<(String, String)>,
}

impl FsHost {
    /// Open a project, registering every file below `root` as a target.
    pub fn open(root: &Path, deploy: &Path, dev: bool) -> Result<Self> {
        let cache_dir = root.join(CACHE_DIR);
        let files = walk_files(root, |p| p == cache_dir || p == deploy)?;
        tracing::debug!("Found {} targets in {}", files.len(), root.display());

        Ok(FsHost {
            root: root.to_path_buf(),
            deploy: deploy.to_path_buf(),
            dev,
            targets: files.into_iter().map(Target::new).collect(),
            outputs: Vec::new(),
            dependencies: Vec::new(),
        })
    }

    /// Keep a project file out of the build targets. It stays readable from
    /// the tree but is not deployed.
    pub fn exclude(&mut self, path: &str) {
        let path = root_relative(path);
        self.targets.retain(|t| t.source_path != path);
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_DIR).join(CACHE_FILE)
    }

    pub fn dependencies(&self) -> &[(String, String)] {
        &self.dependencies
    }

    fn source_path(&self, path: &str) -> PathBuf {
        self.root.join(root_relative(path))
    }

    fn load_cache(&self) -> Result<Map<String, Value>> {
        let path = self.cache_path();
        if !path.exists() {
            return Ok(Map::new());
        }

        let content = read_to_string(&path)?;
        let cache: Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse cache: {}", path.display()))?;
        match cache {
            Value::Object(map) => Ok(map),
            _ => Err(anyhow!("cache is not a JSON object: {}", path.display())),
        }
    }
}

impl TargetRegistry for FsHost {
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
        found.target_path = root_relative(new_name).to_string();
        Ok(found.clone())
    }

    fn create_output_target(&mut self, path: &str, content: String) -> Result<Target> {
        self.outputs.push((path.to_string(), content));
        Ok(Target::new(path))
    }

    fn create_target_from_tree(&mut self, path: &str) -> Result<Target> {
        let source = self.source_path(path);
        if !source.is_file() {
            return Err(anyhow!("file not found in project tree: {}", source.display()));
        }
        Ok(Target::new(root_relative(path)))
    }

    fn remove_target(&mut self, target: &Target) -> Result<()> {
        self.targets.retain(|t| t.source_path != target.source_path);
        Ok(())
    }

    fn load_content(&self, target: &Target) -> Result<String> {
        read_to_string(&self.source_path(&target.source_path))
    }

    fn is_dev(&self) -> bool {
        self.dev
    }

    fn is_target_out_of_date(&self, source: &str, output: &str) -> Result<bool> {
        let source = self.source_path(source);
        let output = self.deploy_path(output);
        if !output.exists() {
            return Ok(true);
        }

        let modified = |path: &Path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .with_context(|| format!("failed to stat file: {}", path.display()))
        };
        Ok(modified(&source)? > modified(&output)?)
    }

    fn add_dependency(&mut self, from: &str, to: &str) {
        tracing::debug!("{} depends on {}", to, from);
        self.dependencies.push((from.to_string(), to.to_string()));
    }

    fn commit(&mut self) -> Result<()> {
        for target in &self.targets {
            let from = self.source_path(&target.source_path);
            let to = self.deploy_path(&target.target_path);
            if let Some(parent) = to.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(&from, &to).with_context(|| {
                format!("failed to copy {} to {}", from.display(), to.display())
            })?;
        }

        for (path, content) in self.outputs.drain(..) {
            write_string(&self.deploy.join(root_relative(&path)), &content)?;
        }

        Ok(())
    }

    fn deploy_path(&self, path: &str) -> PathBuf {
        self.deploy.join(root_relative(path))
    }
}

impl CacheStore for FsHost {
    fn read_cache_property(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load_cache()?.remove(key))
    }

    fn write_cache_property(&mut self, key: &str, value: Value) -> Result<()> {
        let mut cache = self.load_cache()?;
        cache.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&Value::Object(cache))?;
        write_string(&self.cache_path(), &content)
    }
}
