//! Error types for manifest generation.

use std::path::PathBuf;

use thiserror::Error;

/// Broad classification of a [`ManifestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad settings, detected before any I/O.
    Configuration,
    /// Malformed template content.
    Content,
    /// Filesystem or persisted-state failure.
    Io,
}

/// Error raised by the manifest plugin.
///
/// Every message carries the `manifest:` prefix so it can be told apart from
/// errors raised by the host.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest: invalid config: missing '{path}'")]
    MissingField { path: String },

    #[error("manifest: invalid config: '{path}' must be {expected}")]
    WrongType { path: String, expected: String },

    #[error("manifest: manifest.type '{kind}' is not supported")]
    UnsupportedManifestType { kind: String },

    #[error("manifest: '{path}' missing 'key' and/or 'refs' properties")]
    MalformedRefGroup { path: String },

    #[error("manifest: '{path}' is malformed: key '{key}' is invalid")]
    InvalidGroupKey { path: String, key: String },

    #[error("manifest: invalid config: '{path}' has invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        path: String,
        pattern: String,
        message: String,
    },

    #[error("manifest: cannot parse JSON from '{template}'")]
    TemplateParse {
        template: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest: template '{template}' must contain a JSON object")]
    TemplateShape { template: String },

    #[error("manifest: cannot render template '{template}': {message}")]
    TemplateRender { template: String, message: String },

    #[error("manifest: I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest: persisted state is corrupt: {message}")]
    CorruptState { message: String },
}

impl ManifestError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::MissingField { .. }
            | ManifestError::WrongType { .. }
            | ManifestError::UnsupportedManifestType { .. }
            | ManifestError::MalformedRefGroup { .. }
            | ManifestError::InvalidGroupKey { .. }
            | ManifestError::InvalidPattern { .. } => ErrorKind::Configuration,

            ManifestError::TemplateParse { .. }
            | ManifestError::TemplateShape { .. }
            | ManifestError::TemplateRender { .. } => ErrorKind::Content,

            ManifestError::Io { .. } | ManifestError::CorruptState { .. } => ErrorKind::Io,
        }
    }

    /// Create a wrong-type error listing the allowed types.
    pub fn wrong_type(path: impl Into<String>, allowed: &[&str]) -> Self {
        ManifestError::WrongType {
            path: path.into(),
            expected: allowed.join(" or "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_prefix() {
        let err = ManifestError::MissingField {
            path: "settings.output".to_string(),
        };
        assert_eq!(err.to_string(), "manifest: invalid config: missing 'settings.output'");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = ManifestError::wrong_type("settings.targets", &["string", "array"]);
        assert_eq!(
            err.to_string(),
            "manifest: invalid config: 'settings.targets' must be string or array"
        );
    }

    #[test]
    fn test_kind_classification() {
        let err = ManifestError::TemplateShape {
            template: "tpl.json".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Content);

        let err = ManifestError::Io {
            path: PathBuf::from("dist/app.js"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().starts_with("manifest: "));
    }
}
