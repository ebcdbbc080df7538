//! Template-rendered manifests (HTML and PHP).
//!
//! Templates use MiniJinja syntax and receive the manifest as `manifest`.
//! PHP manifests are rendered from a built-in template with a `php` filter
//! that turns any value into a PHP literal.

use anyhow::Result;
use minijinja::Environment;
use serde_json::{json, Map, Value};

use crate::core::errors::ManifestError;
use crate::host::TargetRegistry;
use crate::manifest::{load_template, Manifest};

const PHP_TEMPLATE: &str = "{% if prefixed %}<?php\n\n{% endif %}return {{ data | php }};\n";

/// Render an HTML manifest from its template.
pub fn render_html<R: TargetRegistry + ?Sized>(
    registry: &mut R,
    template: &str,
    manifest: &Manifest,
    output: &str,
) -> Result<String> {
    let source = load_template(registry, template, output)?;
    let ctx = json!({ "manifest": manifest.to_value() });
    Ok(render_minijinja(template, &source, &ctx)?)
}

/// Render a PHP manifest returning the manifest (and any extra data) as an
/// array.
pub fn render_php(
    prefixed: bool,
    extra: Option<&Map<String, Value>>,
    manifest: &Manifest,
    output: &str,
) -> Result<String, ManifestError> {
    let mut data = Map::new();
    data.insert("manifest".to_string(), manifest.to_value());
    if let Some(extra) = extra {
        for (key, value) in extra {
            data.insert(key.clone(), value.clone());
        }
    }

    let ctx = json!({ "prefixed": prefixed, "data": data });
    render_minijinja(output, PHP_TEMPLATE, &ctx)
}

fn render_minijinja(name: &str, source: &str, ctx: &Value) -> Result<String, ManifestError> {
    let render_error = |e: minijinja::Error| ManifestError::TemplateRender {
        template: name.to_string(),
        message: e.to_string(),
    };

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_filter("php", |value: minijinja::Value| -> Result<String, minijinja::Error> {
        let value = serde_json::to_value(&value).map_err(|e| {
            minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
        })?;
        Ok(php_literal(&value))
    });

    env.add_template("manifest", source).map_err(render_error)?;
    let tpl = env.get_template("manifest").map_err(render_error)?;
    tpl.render(minijinja::Value::from_serialize(ctx))
        .map_err(render_error)
}

/// Encode a value as a PHP literal.
fn php_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => php_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(php_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} => {}", php_string(k), php_literal(v)))
                .collect();
            format!("[{}]", entries.join(", "))
        }
    }
}

fn php_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
