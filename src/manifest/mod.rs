//! Manifest construction and serialization.
//!
//! The manifest is either the flat, ordered list of deployed paths or, when
//! grouping rules are configured, a mapping from label to the paths matching
//! that label's globs.

pub mod json;
pub mod template;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::core::settings::{GroupRule, ManifestKind};
use crate::host::TargetRegistry;
use crate::util::fs::glob_matches;

/// The manifest content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    List(Vec<String>),
    Grouped(Vec<(String, Vec<String>)>),
}

impl Manifest {
    /// Build the manifest from the ordered list of deployed paths.
    ///
    /// A path lands in every bucket whose globs match it, possibly none.
    pub fn build(paths: Vec<String>, groups: Option<&[GroupRule]>) -> Self {
        let Some(rules) = groups else {
            return Manifest::List(paths);
        };

        let buckets = rules
            .iter()
            .map(|rule| {
                let matching = paths
                    .iter()
                    .filter(|path| rule.patterns.iter().any(|p| glob_matches(p, path)))
                    .cloned()
                    .collect();
                (rule.label.clone(), matching)
            })
            .collect();

        Manifest::Grouped(buckets)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Manifest::List(paths) => Value::from(paths.clone()),
            Manifest::Grouped(buckets) => {
                let map: Map<String, Value> = buckets
                    .iter()
                    .map(|(label, paths)| (label.clone(), Value::from(paths.clone())))
                    .collect();
                Value::Object(map)
            }
        }
    }
}

/// Resolve a template and load its content.
///
/// A template that is itself a build target is taken out of the build and
/// recorded as a dependency of the output. Otherwise it is read from the
/// project tree.
pub fn load_template<R: TargetRegistry + ?Sized>(
    registry: &mut R,
    template: &str,
    output: &str,
) -> Result<String> {
    let target = match registry.lookup_target(template) {
        Some(target) => {
            tracing::debug!("Using build target {} as template", template);
            registry.remove_target(&target)?;
            registry.add_dependency(template, output);
            target
        }
        None => registry.create_target_from_tree(template)?,
    };

    registry.load_content(&target)
}

/// Serialize a manifest in the configured format.
pub fn render<R: TargetRegistry + ?Sized>(
    kind: &ManifestKind,
    manifest: &Manifest,
    output: &str,
    registry: &mut R,
) -> Result<String> {
    match kind {
        ManifestKind::Json { template, prop } => {
            json::render(registry, template.as_deref(), prop, manifest, output)
        }
        ManifestKind::Html { template } => template::render_html(registry, template, manifest, output),
        ManifestKind::Php { prefixed, extra } => {
            Ok(template::render_php(*prefixed, extra.as_ref(), manifest, output)?)
        }
    }
}
