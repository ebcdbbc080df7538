//! JSON manifests.

use anyhow::Result;
use serde_json::Value;

use crate::core::errors::ManifestError;
use crate::host::TargetRegistry;
use crate::manifest::{load_template, Manifest};

/// Render a JSON manifest.
///
/// With a template, the manifest is injected into the template's top-level
/// object under `prop`. Without one, the manifest itself is the document.
pub fn render<R: TargetRegistry + ?Sized>(
    registry: &mut R,
    template: Option<&str>,
    prop: &str,
    manifest: &Manifest,
    output: &str,
) -> Result<String> {
    let document = match template {
        Some(template) => {
            let content = load_template(registry, template, output)?;
            inject(template, &content, prop, manifest.to_value())?
        }
        None => manifest.to_value(),
    };

    Ok(serde_json::to_string(&document)?)
}

fn inject(template: &str, content: &str, prop: &str, manifest: Value) -> Result<Value, ManifestError> {
    let mut document: Value =
        serde_json::from_str(content).map_err(|source| ManifestError::TemplateParse {
            template: template.to_string(),
            source,
        })?;

    let Value::Object(map) = &mut document else {
        return Err(ManifestError::TemplateShape {
            template: template.to_string(),
        });
    };
    map.insert(prop.to_string(), manifest);

    Ok(document)
}
