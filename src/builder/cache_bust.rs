//! Cache-busting of generated filenames.
//!
//! Each build draws one random suffix and inserts it between the base name
//! and the extension of every busted file, so browsers never serve a stale
//! copy of a changed asset.

use std::fmt;

use glob::Pattern;
use rand::Rng;
use regex::Regex;

use crate::util::fs::glob_matches;

/// Digits used to encode suffixes.
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A pattern selecting source paths for cache-busting.
#[derive(Debug, Clone)]
pub enum BustPattern {
    Glob(Pattern),
    Regex(Regex),
}

impl BustPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            BustPattern::Glob(pattern) => glob_matches(pattern, path),
            BustPattern::Regex(regex) => regex.is_match(path),
        }
    }
}

/// Which source paths get a cache-busting suffix.
#[derive(Debug, Clone)]
pub enum CacheBusting {
    Disabled,
    Always,
    Matching(Vec<BustPattern>),
}

impl Default for CacheBusting {
    /// Scripts and stylesheets.
    fn default() -> Self {
        let patterns = [r"\.js$", r"\.css$"]
            .iter()
            .filter_map(|source| Regex::new(source).ok())
            .map(BustPattern::Regex)
            .collect();
        CacheBusting::Matching(patterns)
    }
}

impl CacheBusting {
    /// Check if a source path should be busted.
    pub fn applies(&self, path: &str) -> bool {
        match self {
            CacheBusting::Disabled => false,
            CacheBusting::Always => true,
            CacheBusting::Matching(patterns) => patterns.iter().any(|p| p.matches(path)),
        }
    }
}

/// The cache-busting suffix of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suffix(String);

impl Suffix {
    /// Draw a fresh suffix from 64 random bits.
    pub fn generate() -> Self {
        Suffix::from_bits(rand::thread_rng().gen())
    }

    /// Encode a suffix from a fixed value.
    pub fn from_bits(mut bits: u64) -> Self {
        let mut digits = Vec::with_capacity(13);
        loop {
            digits.push(ALPHABET[(bits % 36) as usize]);
            bits /= 36;
            if bits == 0 {
                break;
            }
        }
        digits.push(b'.');
        digits.reverse();
        Suffix(digits.into_iter().map(char::from).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Insert this suffix into a path.
    pub fn apply(&self, path: &str) -> String {
        apply_suffix(path, self.as_str())
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert `suffix` between the base name and the extension of `path`.
///
/// `css/app.css` becomes `css/app<suffix>.css`. A leading dot does not start
/// an extension, so `.htaccess` becomes `.htaccess<suffix>`.
pub fn apply_suffix(path: &str, suffix: &str) -> String {
    let (dir, name) = match path.rfind('/') {
        Some(index) => path.split_at(index + 1),
        None => ("", path),
    };

    let (base, ext) = match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    };

    format!("{}{}{}{}", dir, base, suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_apply_suffix() {
        assert_eq!(apply_suffix("css/app.css", ".k3x"), "css/app.k3x.css");
        assert_eq!(apply_suffix("app.min.js", "-1"), "app.min-1.js");
        assert_eq!(apply_suffix("dist/LICENSE", ".s"), "dist/LICENSE.s");
        assert_eq!(apply_suffix(".htaccess", ".s"), ".htaccess.s");
        assert_eq!(apply_suffix("a.b/file", ".s"), "a.b/file.s");
    }

    #[test]
    fn test_suffix_apply_is_pure() {
        let suffix = Suffix::from_bits(42);
        assert_eq!(suffix.as_str(), ".16");
        assert_eq!(suffix.apply("css/app.css"), format!("css/app{}.css", suffix));
        assert_eq!(suffix.apply("css/app.css"), suffix.apply("css/app.css"));
    }

    #[test]
    fn test_suffix_encoding() {
        assert_eq!(Suffix::from_bits(0).as_str(), ".0");
        assert_eq!(Suffix::from_bits(35).as_str(), ".z");
        assert_eq!(Suffix::from_bits(u64::MAX).as_str(), ".3w5e11264sgsf");
    }

    #[test]
    fn test_suffixes_do_not_collide() {
        let suffixes: HashSet<String> = (0..10_000)
            .map(|_| Suffix::generate().as_str().to_string())
            .collect();
        assert_eq!(suffixes.len(), 10_000);
    }

    #[test]
    fn test_policy() {
        assert!(!CacheBusting::Disabled.applies("app.js"));
        assert!(CacheBusting::Always.applies("logo.png"));

        let default = CacheBusting::default();
        assert!(default.applies("dist/app.js"));
        assert!(default.applies("dist/site.css"));
        assert!(!default.applies("dist/app.js.map"));

        let globs = CacheBusting::Matching(vec![BustPattern::Glob(
            Pattern::new("img/*.png").unwrap(),
        )]);
        assert!(globs.applies("img/a.png"));
        assert!(!globs.applies("img/sub/a.png"));
    }
}
