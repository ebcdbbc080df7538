//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use deploy_manifest::util::config::load_settings_file;
use deploy_manifest::{FsHost, ManifestPlugin};

pub mod build;
pub mod check;

/// Load the settings file and open the project behind it.
///
/// The deploy directory is not created here; `build` creates it first.
fn open_project(settings: &Path, root: &Path, deploy: &Path, dev: bool) -> Result<(Value, FsHost)> {
    let raw = load_settings_file(settings)?;

    let root = root
        .canonicalize()
        .with_context(|| format!("project root not found: {}", root.display()))?;
    let deploy = resolve_dir(deploy)?;

    let host = FsHost::open(&root, &deploy, dev)?;
    Ok((raw, host))
}

/// Absolute form of a directory that may not exist yet.
fn resolve_dir(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("failed to resolve directory: {}", path.display()));
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join(path))
}

/// Bind the plugin to its settings. The manifest template is a source file,
/// so it is taken out of the deployed targets.
fn plugin_for(raw: Value, host: &mut FsHost) -> Result<ManifestPlugin> {
    let mut plugin = ManifestPlugin::new(raw);
    if let Some(template) = plugin.settings()?.manifest.template() {
        host.exclude(template);
    }
    Ok(plugin)
}
