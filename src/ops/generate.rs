//! The manifest build pipeline.
//!
//! 1. Build the matrix of ref groups from settings and build targets.
//! 2. Unless tracking is disabled, reconcile it with the previous build's
//!    state, staging stale files for deletion.
//! 3. Render the manifest and hand it to the host as an output target.
//! 4. Let the host write its targets, delete stale files, then persist the
//!    merged matrix.
//!
//! State is persisted only after every stale file is gone. If the build
//! fails before that, the next build starts from the same previous state and
//! stages the same files again.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::context::RunContext;
use crate::builder::matrix::build_matrix;
use crate::core::errors::ManifestError;
use crate::core::refs::{flatten, Group};
use crate::core::settings::Settings;
use crate::core::state::{PersistedState, OUTPUT_CACHE_KEY};
use crate::host::{CacheStore, Host, TargetRegistry};
use crate::manifest::{render, Manifest};
use crate::util::fs::remove_file_if_exists;

/// Outcome of a manifest build.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Merged matrix (persisted as the new state)
    pub matrix: Vec<Group>,

    /// Rendered manifest content
    pub content: String,

    /// Deploy paths staged for deletion
    pub unlinked: Vec<String>,
}

/// Run the pipeline with a fresh per-build context.
pub fn generate<H: Host + ?Sized>(settings: &Settings, host: &mut H) -> Result<GenerateResult> {
    let ctx = RunContext::new(host.is_dev());
    generate_with(settings, &ctx, host)
}

/// Run the pipeline with the given per-build context.
pub fn generate_with<H: Host + ?Sized>(
    settings: &Settings,
    ctx: &RunContext,
    host: &mut H,
) -> Result<GenerateResult> {
    let mut matrix = build_matrix(settings, ctx, host)?;
    let mut unlink = Vec::new();

    if !settings.disable_tracking {
        matrix = preprocess_output(&*host, matrix, &settings.output, &mut unlink)?;
    }

    let manifest = Manifest::build(flatten(&matrix), settings.groups.as_deref());
    let content = render(&settings.manifest, &manifest, &settings.output, host)?;
    host.create_output_target(&settings.output, content.clone())?;
    host.commit()?;

    if !settings.disable_tracking {
        let paths: Vec<PathBuf> = unlink.iter().map(|p| host.deploy_path(p)).collect();
        unlink_stale(&paths)?;

        let state = PersistedState::new(matrix.clone(), settings.output.as_str());
        host.write_cache_property(OUTPUT_CACHE_KEY, state.to_value()?)
            .context("manifest: failed to persist build state")?;
    }

    Ok(GenerateResult {
        matrix,
        content,
        unlinked: unlink,
    })
}

/// Reconcile the matrix with the previous build's state.
fn preprocess_output<C: CacheStore + ?Sized>(
    cache: &C,
    matrix: Vec<Group>,
    output: &str,
    unlink: &mut Vec<String>,
) -> Result<Vec<Group>> {
    let Some(value) = cache
        .read_cache_property(OUTPUT_CACHE_KEY)
        .context("manifest: failed to read build state")?
    else {
        return Ok(matrix);
    };

    // An unreadable state aborts the build before anything is written, so
    // the stored state and its pending deletions survive for inspection.
    let prev = PersistedState::from_value(value, &matrix)?;

    let merged = if prev.refs.is_empty() {
        matrix
    } else {
        crate::ops::reconcile::reconcile(matrix, prev.refs, unlink)
    };

    if let Some(manifest) = prev.manifest.filter(|m| m != output) {
        unlink.push(manifest);
    }

    Ok(merged)
}

/// Delete stale files. Files that are already gone are skipped.
fn unlink_stale(paths: &[PathBuf]) -> Result<(), ManifestError> {
    paths.par_iter().try_for_each(|path| {
        if remove_file_if_exists(path)? {
            tracing::info!("Unlinked {}", path.display());
        }
        Ok(())
    })
}
