//! Validation-only entry point.

use anyhow::Result;
use serde_json::Value;

use crate::core::settings::Settings;
use crate::host::TargetRegistry;

/// Result of auditing the plugin settings.
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// The validated settings
    pub settings: Settings,

    /// The manifest template lives outside the build targets and changed
    /// since the manifest was last written
    pub template_out_of_date: bool,
}

/// Validate raw settings and check whether the manifest must be regenerated
/// because its template changed.
pub fn audit<R: TargetRegistry + ?Sized>(raw: &Value, registry: &R) -> Result<AuditReport> {
    let settings = Settings::from_value(raw)?;

    let template_out_of_date = match settings.manifest.template() {
        Some(template) if registry.lookup_target(template).is_none() => {
            registry.is_target_out_of_date(template, &settings.output)?
        }
        _ => false,
    };

    if template_out_of_date {
        tracing::debug!(
            "Template {} changed since {} was written",
            settings.manifest.template().unwrap_or_default(),
            settings.output
        );
    }

    Ok(AuditReport {
        settings,
        template_out_of_date,
    })
}
