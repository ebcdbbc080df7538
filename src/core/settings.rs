//! Typed plugin settings.
//!
//! [`Settings::from_value`] validates the raw configuration tree handed over by
//! the host. Validation is synchronous and performs no I/O: every problem is
//! reported as a [`ManifestError`] naming the offending path before the build
//! touches anything.

use glob::Pattern;
use regex::Regex;
use serde_json::{Map, Value};

use crate::builder::cache_bust::{BustPattern, CacheBusting};
use crate::core::errors::ManifestError;
use crate::core::refs::{Group, GroupKey, Ref};
use crate::util::config::{
    as_string, check, check_array, check_optional, check_value, regex_source, ConfigPath,
    ValueKind,
};
use crate::util::fs::compile_glob;

/// Default property receiving the manifest in a JSON template.
pub const DEFAULT_JSON_PROP: &str = "manifest";

/// Manifest output format and its format-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestKind {
    Json {
        template: Option<String>,
        prop: String,
    },
    Html {
        template: String,
    },
    Php {
        prefixed: bool,
        extra: Option<Map<String, Value>>,
    },
}

impl Default for ManifestKind {
    fn default() -> Self {
        ManifestKind::Json {
            template: None,
            prop: DEFAULT_JSON_PROP.to_string(),
        }
    }
}

impl ManifestKind {
    /// The `type` tag of this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            ManifestKind::Json { .. } => "json",
            ManifestKind::Html { .. } => "html",
            ManifestKind::Php { .. } => "php",
        }
    }

    /// The template path, if this variant uses one.
    pub fn template(&self) -> Option<&str> {
        match self {
            ManifestKind::Json { template, .. } => template.as_deref(),
            ManifestKind::Html { template } => Some(template),
            ManifestKind::Php { .. } => None,
        }
    }
}

/// One manifest grouping label and the globs selecting its paths.
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub label: String,
    pub patterns: Vec<Pattern>,
}

/// Validated plugin settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Manifest output path
    pub output: String,

    /// Manifest format
    pub manifest: ManifestKind,

    /// Globs selecting build targets to track
    pub targets: Vec<Pattern>,

    /// Declared ref groups
    pub refs: Vec<Group>,

    /// Manifest grouping rules (None = flat list)
    pub groups: Option<Vec<GroupRule>>,

    /// Skip reconciliation, stale deletion and persistence
    pub disable_tracking: bool,

    /// Cache-busting policy
    pub cache_busting: CacheBusting,
}

impl Settings {
    /// Validate a raw configuration tree.
    pub fn from_value(raw: &Value) -> Result<Self, ManifestError> {
        let root = ConfigPath::root("settings");
        let settings = match raw {
            Value::Object(map) => map,
            _ => return Err(ManifestError::wrong_type("settings", &["object"])),
        };

        let output = as_string(
            &root.key("output"),
            check(&root, settings, "output", &[ValueKind::String])?,
        )?;

        let manifest = match check_optional(&root, settings, "manifest", &[ValueKind::Object])? {
            Some(Value::Object(map)) => parse_manifest(map)?,
            _ => ManifestKind::default(),
        };

        let targets = parse_targets(&root, settings)?;
        let refs = parse_refs(&root, settings)?;
        let groups = parse_groups(&root, settings)?;

        let disable_tracking =
            check_optional(&root, settings, "disableTracking", &[ValueKind::Boolean])?
                .and_then(Value::as_bool)
                .unwrap_or(false);

        let disable_cache_busting =
            check_optional(&root, settings, "disableCacheBusting", &[ValueKind::Boolean])?
                .and_then(Value::as_bool)
                .unwrap_or(false);

        let cache_busting = if disable_cache_busting {
            CacheBusting::Disabled
        } else {
            parse_cache_busting(&root, settings)?
        };

        Ok(Settings {
            output,
            manifest,
            targets,
            refs,
            groups,
            disable_tracking,
            cache_busting,
        })
    }
}

fn parse_manifest(map: &Map<String, Value>) -> Result<ManifestKind, ManifestError> {
    let ctx = ConfigPath::root("manifest");
    let kind = check(&ctx, map, "type", &[ValueKind::String])?
        .as_str()
        .unwrap_or_default();

    let optional_string = |name: &str| -> Result<Option<String>, ManifestError> {
        check_optional(&ctx, map, name, &[ValueKind::String])?
            .map(|v| as_string(&ctx.key(name), v))
            .transpose()
    };

    match kind {
        "json" => Ok(ManifestKind::Json {
            template: optional_string("template")?,
            prop: optional_string("prop")?.unwrap_or_else(|| DEFAULT_JSON_PROP.to_string()),
        }),
        "html" => Ok(ManifestKind::Html {
            template: as_string(
                &ctx.key("template"),
                check(&ctx, map, "template", &[ValueKind::String])?,
            )?,
        }),
        "php" => {
            let prefixed = check_optional(&ctx, map, "prefixed", &[ValueKind::Boolean])?
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let extra = check_optional(&ctx, map, "extra", &[ValueKind::Object])?
                .and_then(Value::as_object)
                .cloned();
            Ok(ManifestKind::Php { prefixed, extra })
        }
        other => Err(ManifestError::UnsupportedManifestType {
            kind: other.to_string(),
        }),
    }
}

fn parse_targets(
    root: &ConfigPath,
    settings: &Map<String, Value>,
) -> Result<Vec<Pattern>, ManifestError> {
    let path = root.key("targets");
    let globs: Vec<String> =
        match check_optional(root, settings, "targets", &[ValueKind::String, ValueKind::Array])? {
            None => Vec::new(),
            Some(value @ Value::Array(_)) => check_array(&path, value, &[ValueKind::String])?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(value) => vec![as_string(&path, value)?],
        };

    globs
        .iter()
        .enumerate()
        .map(|(index, glob)| compile_glob(&path.index(index), glob))
        .collect()
}

fn parse_refs(root: &ConfigPath, settings: &Map<String, Value>) -> Result<Vec<Group>, ManifestError> {
    let path = root.key("refs");
    let Some(value) = check_optional(root, settings, "refs", &[ValueKind::Array])? else {
        return Ok(Vec::new());
    };

    let items = check_array(
        &path,
        value,
        &[ValueKind::String, ValueKind::Array, ValueKind::Object],
    )?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_ref(&path.index(index), index, item))
        .collect()
}

/// Turn one declared `refs` entry into a group.
fn normalize_ref(ctx: &ConfigPath, index: usize, item: &Value) -> Result<Group, ManifestError> {
    match item {
        Value::String(file) => Ok(Group::singleton(index, Ref::declared(file.as_str()))),
        Value::Array(_) => Ok(Group::new(
            GroupKey::Index(index),
            string_list(ctx, item)?.into_iter().map(Ref::declared).collect(),
        )),
        Value::Object(map) => {
            let (Some(key), Some(refs)) = (map.get("key"), map.get("refs")) else {
                return Err(ManifestError::MalformedRefGroup {
                    path: ctx.to_string(),
                });
            };

            let key = match key {
                Value::String(key) if !is_numeric(key) => key.clone(),
                Value::String(key) => {
                    return Err(ManifestError::InvalidGroupKey {
                        path: ctx.to_string(),
                        key: key.clone(),
                    })
                }
                other => {
                    return Err(ManifestError::InvalidGroupKey {
                        path: ctx.to_string(),
                        key: other.to_string(),
                    })
                }
            };

            let refs = string_list(&ctx.key("refs"), refs)?
                .into_iter()
                .map(Ref::declared)
                .collect();

            Ok(Group::new(GroupKey::Name(key), refs))
        }
        _ => Err(ManifestError::wrong_type(
            ctx.to_string(),
            &["string", "array", "object"],
        )),
    }
}

fn string_list(path: &ConfigPath, value: &Value) -> Result<Vec<String>, ManifestError> {
    Ok(check_array(path, value, &[ValueKind::String])?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

fn is_numeric(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn parse_groups(
    root: &ConfigPath,
    settings: &Map<String, Value>,
) -> Result<Option<Vec<GroupRule>>, ManifestError> {
    let path = root.key("groups");
    let value = match settings.get("groups") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
        Some(value) => value,
    };

    // Group maps are plain objects, even with a label named `regex`.
    let objects: Vec<(ConfigPath, &Map<String, Value>)> = match value {
        Value::Object(map) => vec![(path.clone(), map)],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok((path.index(index), map)),
                _ => Err(ManifestError::wrong_type(
                    path.index(index).to_string(),
                    &["object"],
                )),
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(ManifestError::wrong_type(
                path.to_string(),
                &["object", "array"],
            ))
        }
    };

    let mut rules: Vec<GroupRule> = Vec::new();
    for (ctx, map) in objects {
        for (label, globs) in map {
            let label_path = ctx.key(label);
            let globs: Vec<(ConfigPath, String)> = match check_value(
                &label_path,
                Some(globs),
                &[ValueKind::String, ValueKind::Array],
            )? {
                Value::String(glob) => vec![(label_path.clone(), glob.clone())],
                list => string_list(&label_path, list)?
                    .into_iter()
                    .enumerate()
                    .map(|(index, glob)| (label_path.index(index), glob))
                    .collect(),
            };

            let patterns = globs
                .iter()
                .map(|(glob_path, glob)| compile_glob(glob_path, glob))
                .collect::<Result<Vec<_>, _>>()?;

            match rules.iter_mut().find(|r| &r.label == label) {
                Some(rule) => rule.patterns.extend(patterns),
                None => rules.push(GroupRule {
                    label: label.clone(),
                    patterns,
                }),
            }
        }
    }

    Ok(Some(rules))
}

fn parse_cache_busting(
    root: &ConfigPath,
    settings: &Map<String, Value>,
) -> Result<CacheBusting, ManifestError> {
    let path = root.key("cacheBusting");
    let value = match check_optional(
        root,
        settings,
        "cacheBusting",
        &[ValueKind::Boolean, ValueKind::Array],
    )? {
        None => return Ok(CacheBusting::default()),
        Some(Value::Bool(true)) => return Ok(CacheBusting::Always),
        Some(Value::Bool(false)) => return Ok(CacheBusting::Disabled),
        Some(value) => value,
    };

    let items = check_array(&path, value, &[ValueKind::String, ValueKind::Regex])?;
    let mut patterns = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = path.index(index);
        let pattern = match (item.as_str(), regex_source(item)) {
            (Some(glob), _) => BustPattern::Glob(compile_glob(&item_path, glob)?),
            (None, Some(source)) => {
                BustPattern::Regex(Regex::new(source).map_err(|e| ManifestError::InvalidPattern {
                    path: item_path.to_string(),
                    pattern: source.to_string(),
                    message: e.to_string(),
                })?)
            }
            (None, None) => {
                return Err(ManifestError::wrong_type(
                    item_path.to_string(),
                    &["string", "regex"],
                ))
            }
        };
        patterns.push(pattern);
    }

    Ok(CacheBusting::Matching(patterns))
}
