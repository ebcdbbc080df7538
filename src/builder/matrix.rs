//! Construction of the ref matrix for one build.
//!
//! The matrix starts from the declared ref groups. Declared refs naming a
//! build target are claimed by that target (and busted if the policy says
//! so). Every unclaimed target matching a `targets` glob then gets a
//! singleton group of its own.

use std::collections::HashMap;

use anyhow::Result;
use url::Url;

use crate::builder::context::RunContext;
use crate::core::refs::{Group, Ref};
use crate::core::settings::Settings;
use crate::host::{Target, TargetRegistry};
use crate::util::fs::glob_matches;

/// Check if a ref points outside the project (a URL).
pub fn is_external(file: &str) -> bool {
    if file.starts_with("//") {
        return true;
    }
    Url::parse(file).map(|url| url.has_host()).unwrap_or(false)
}

/// Builds the matrix of ref groups for the current build.
pub struct MatrixBuilder<'a, R: TargetRegistry + ?Sized> {
    settings: &'a Settings,
    ctx: &'a RunContext,
    registry: &'a mut R,
    /// Claimed source paths and their manifest entries
    claimed: HashMap<String, String>,
}

impl<'a, R: TargetRegistry + ?Sized> MatrixBuilder<'a, R> {
    pub fn new(settings: &'a Settings, ctx: &'a RunContext, registry: &'a mut R) -> Self {
        MatrixBuilder {
            settings,
            ctx,
            registry,
            claimed: HashMap::new(),
        }
    }

    /// Build the matrix.
    pub fn build(mut self) -> Result<Vec<Group>> {
        let mut groups = self.settings.refs.clone();

        for group in &mut groups {
            for r in &mut group.refs {
                if is_external(&r.file) {
                    continue;
                }
                let Some(target) = self.registry.lookup_target(&r.file) else {
                    continue;
                };

                // A target is renamed once, however many refs name it.
                let claimed = self.claimed.get(&target.source_path).cloned();
                r.entry = match claimed {
                    Some(entry) => entry,
                    None => {
                        let entry = self.bust(&target)?;
                        self.claimed.insert(target.source_path, entry.clone());
                        entry
                    }
                };
                r.unlink = true;
            }
        }

        if !self.settings.targets.is_empty() {
            for target in self.registry.targets() {
                if self.claimed.contains_key(&target.source_path) || !self.selects(&target) {
                    continue;
                }

                tracing::debug!("Tracking target {}", target.source_path);
                let entry = self.bust(&target)?;
                let r = Ref {
                    entry: entry.clone(),
                    ..Ref::target(target.source_path.as_str())
                };
                groups.push(Group::singleton(groups.len(), r));
                self.claimed.insert(target.source_path, entry);
            }
        }

        Ok(groups)
    }

    fn selects(&self, target: &Target) -> bool {
        self.settings
            .targets
            .iter()
            .any(|glob| glob_matches(glob, &target.source_path))
    }

    /// Apply cache-busting to a target, returning its manifest entry.
    fn bust(&mut self, target: &Target) -> Result<String> {
        if self.ctx.dev || !self.settings.cache_busting.applies(&target.source_path) {
            return Ok(target.source_path.clone());
        }

        let name = self.ctx.suffix.apply(&target.target_path);
        let renamed = self.registry.rename_target(target, &name)?;
        tracing::debug!("Busted {} -> {}", target.source_path, renamed.target_path);
        Ok(renamed.target_path)
    }
}

/// Build the matrix of ref groups for the current build.
pub fn build_matrix<R: TargetRegistry + ?Sized>(
    settings: &Settings,
    ctx: &RunContext,
    registry: &mut R,
) -> Result<Vec<Group>> {
    MatrixBuilder::new(settings, ctx, registry).build()
}
