//! Filesystem and path utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::core::errors::ManifestError;
use crate::util::config::ConfigPath;

/// Glob options: `*` stops at `/`, `**` crosses directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Normalize a path to its root-relative form (`/a/b`, `./a/b` -> `a/b`).
pub fn root_relative(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

/// Compile a configured glob, anchored at the project root.
pub fn compile_glob(path: &ConfigPath, glob: &str) -> Result<Pattern, ManifestError> {
    Pattern::new(root_relative(glob)).map_err(|e| ManifestError::InvalidPattern {
        path: path.to_string(),
        pattern: glob.to_string(),
        message: e.msg.to_string(),
    })
}

/// Match a project path against a compiled glob.
pub fn glob_matches(pattern: &Pattern, path: &str) -> bool {
    pattern.matches_with(root_relative(path), MATCH_OPTIONS)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Remove a file. Returns `false` if it was already absent.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, ManifestError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ManifestError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// List every file below `root` as a `/`-separated root-relative path.
///
/// Directories for which `skip` returns true are not descended into.
pub fn walk_files(root: &Path, skip: impl Fn(&Path) -> bool) -> Result<Vec<String>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !skip(entry.path()));

    for entry in walker {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(to_project_path(&relative_path(root, entry.path())));
        }
    }

    Ok(files)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with `/` separators.
pub fn to_project_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn glob(pattern: &str) -> Pattern {
        compile_glob(&ConfigPath::root("test"), pattern).unwrap()
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(root_relative("/dist/app.js"), "dist/app.js");
        assert_eq!(root_relative("./dist/app.js"), "dist/app.js");
        assert_eq!(root_relative("dist/app.js"), "dist/app.js");
    }

    #[test]
    fn test_glob_matching() {
        assert!(glob_matches(&glob("**/*.js"), "a.js"));
        assert!(glob_matches(&glob("**/*.js"), "/dist/js/a.js"));
        assert!(glob_matches(&glob("dist/*.js"), "dist/app.js"));
        assert!(!glob_matches(&glob("dist/*.js"), "dist/sub/app.js"));
        assert!(glob_matches(&glob("/dist/**"), "dist/sub/app.js"));
        assert!(!glob_matches(&glob("**/*.js"), "b.css"));
    }

    #[test]
    fn test_invalid_glob() {
        let err = compile_glob(&ConfigPath::root("settings").key("targets").index(0), "a/***")
            .unwrap_err();
        assert!(err.to_string().contains("'settings.targets[0]'"));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("stale.js");
        fs::write(&file, "x").unwrap();

        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!file.exists());
        assert!(!remove_file_if_exists(&file).unwrap());
    }

    #[test]
    fn test_walk_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("js")).unwrap();
        fs::create_dir_all(tmp.path().join(".cache")).unwrap();
        fs::write(src.join("js/app.js"), "").unwrap();
        fs::write(src.join("site.css"), "").unwrap();
        fs::write(tmp.path().join(".cache/state.json"), "{}").unwrap();

        let files = walk_files(tmp.path(), |p| p.ends_with(".cache")).unwrap();
        assert_eq!(files, vec!["src/js/app.js", "src/site.css"]);
    }
}
