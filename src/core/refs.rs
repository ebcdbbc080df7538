//! Refs and ref groups.
//!
//! A [`Ref`] maps one source path to the path written into the manifest. Refs
//! are tracked in [`Group`]s, the unit of cross-build reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a group.
///
/// Named keys are declared by the user and keep their identity across builds.
/// Positional keys are matched by content, never by their index value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Index(usize),
    Name(String),
}

impl GroupKey {
    /// Check if this is a positional key.
    pub fn is_positional(&self) -> bool {
        matches!(self, GroupKey::Index(_))
    }

    /// Get the key name, if this is a named key.
    pub fn name(&self) -> Option<&str> {
        match self {
            GroupKey::Name(name) => Some(name),
            GroupKey::Index(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Index(index) => write!(f, "{}", index),
            GroupKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// One tracked manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Original source path
    pub file: String,

    /// Path written into the manifest (after cache-busting)
    pub entry: String,

    /// Whether this build owns the file at `entry`
    #[serde(default)]
    pub unlink: bool,
}

impl Ref {
    /// Create a ref declared by hand, not owned by the build.
    pub fn declared(file: impl Into<String>) -> Self {
        let file = file.into();
        Ref {
            entry: file.clone(),
            file,
            unlink: false,
        }
    }

    /// Create a ref for a build target.
    pub fn target(file: impl Into<String>) -> Self {
        Ref {
            unlink: true,
            ..Ref::declared(file)
        }
    }
}

/// An ordered collection of refs sharing one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub key: GroupKey,
    pub refs: Vec<Ref>,
}

impl Group {
    pub fn new(key: GroupKey, refs: Vec<Ref>) -> Self {
        Group { key, refs }
    }

    /// Create a positional group holding a single ref.
    pub fn singleton(index: usize, r: Ref) -> Self {
        Group::new(GroupKey::Index(index), vec![r])
    }

    /// Find the ref for a source path.
    pub fn find(&self, file: &str) -> Option<&Ref> {
        self.refs.iter().find(|r| r.file == file)
    }

    /// Check if any ref in this group shares a source path with `other`.
    pub fn shares_file_with(&self, other: &Group) -> bool {
        self.refs.iter().any(|a| other.refs.iter().any(|b| a.file == b.file))
    }

    /// Check whether this (current) group corresponds to a previous group.
    ///
    /// Named keys correspond by equality. Positional keys correspond only to
    /// positional keys, and only when the groups share at least one file.
    pub fn corresponds_to(&self, previous: &Group) -> bool {
        match (&self.key, &previous.key) {
            (GroupKey::Name(a), GroupKey::Name(b)) => a == b,
            (GroupKey::Index(_), GroupKey::Index(_)) => self.shares_file_with(previous),
            _ => false,
        }
    }
}

/// Flatten a matrix into its ordered list of manifest entries.
pub fn flatten(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .flat_map(|g| g.refs.iter().map(|r| r.entry.clone()))
        .collect()
}
