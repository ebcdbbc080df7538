//! State persisted between builds.
//!
//! After every tracked build the merged matrix and the manifest output path
//! are stored in the host cache under [`OUTPUT_CACHE_KEY`]. The next build
//! reconciles against it.
//!
//! Older builds stored each group as a bare list of refs, without the
//! `{key, refs}` wrapper. Such groups are upgraded on load.
//!
//! Groups are loaded one by one. A damaged group keeps every ref that still
//! parses, so its pending deletions are not lost. Only a state whose overall
//! shape is unreadable is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ManifestError;
use crate::core::refs::{Group, GroupKey, Ref};

/// Cache property holding the previous build's state.
pub const OUTPUT_CACHE_KEY: &str = "manifest.output";

/// The previous build's matrix and manifest path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistedState {
    pub refs: Vec<Group>,
    pub manifest: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredGroup {
    Keyed(Group),
    Legacy(Vec<Ref>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredState {
    Full {
        #[serde(default)]
        refs: Vec<Value>,
        #[serde(default)]
        manifest: Option<String>,
    },
    Bare(Vec<Value>),
}

impl PersistedState {
    pub fn new(refs: Vec<Group>, manifest: impl Into<String>) -> Self {
        PersistedState {
            refs,
            manifest: Some(manifest.into()),
        }
    }

    /// Load a stored state, upgrading legacy groups.
    ///
    /// A legacy group takes the key of the first `current` group sharing a
    /// file with it, and otherwise its own position.
    pub fn from_value(value: Value, current: &[Group]) -> Result<Self, ManifestError> {
        let stored: StoredState =
            serde_json::from_value(value).map_err(|e| ManifestError::CorruptState {
                message: e.to_string(),
            })?;

        let (groups, manifest) = match stored {
            StoredState::Full { refs, manifest } => (refs, manifest),
            StoredState::Bare(refs) => (refs, None),
        };

        let refs = groups
            .into_iter()
            .enumerate()
            .filter_map(|(index, group)| load_group(index, group, current))
            .collect();

        Ok(PersistedState { refs, manifest })
    }

    pub fn to_value(&self) -> Result<Value, ManifestError> {
        serde_json::to_value(self).map_err(|e| ManifestError::CorruptState {
            message: e.to_string(),
        })
    }
}

fn load_group(index: usize, value: Value, current: &[Group]) -> Option<Group> {
    match serde_json::from_value::<StoredGroup>(value.clone()) {
        Ok(StoredGroup::Keyed(group)) => Some(group),
        Ok(StoredGroup::Legacy(refs)) => Some(upgrade_legacy(index, refs, current)),
        Err(_) => salvage_group(index, value, current),
    }
}

/// Recover the readable refs of a damaged group.
fn salvage_group(index: usize, value: Value, current: &[Group]) -> Option<Group> {
    let (key, items) = match value {
        Value::Array(items) => (None, items),
        Value::Object(mut map) => {
            let key = map
                .remove("key")
                .and_then(|key| serde_json::from_value::<GroupKey>(key).ok());
            match map.remove("refs") {
                Some(Value::Array(items)) => (key, items),
                _ => (key, Vec::new()),
            }
        }
        _ => (None, Vec::new()),
    };

    let total = items.len();
    let refs: Vec<Ref> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    tracing::warn!(
        "Previous group {} is malformed, kept {} of {} refs",
        index,
        refs.len(),
        total
    );

    if refs.is_empty() {
        return None;
    }
    Some(match key {
        Some(key) => Group::new(key, refs),
        None => upgrade_legacy(index, refs, current),
    })
}

fn upgrade_legacy(index: usize, refs: Vec<Ref>, current: &[Group]) -> Group {
    let legacy = Group::new(GroupKey::Index(index), refs);
    match current.iter().find(|g| g.shares_file_with(&legacy)) {
        Some(matched) => Group {
            key: matched.key.clone(),
            ..legacy
        },
        None => legacy,
    }
}
