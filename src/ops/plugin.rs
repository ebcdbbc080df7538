//! Host-facing plugin entry points.
//!
//! A host first calls [`ManifestPlugin::audit`] while checking its
//! configuration, then [`ManifestPlugin::exec`] during the build. Settings
//! validated by the audit are reused by `exec`.

use anyhow::Result;
use serde_json::Value;

use crate::core::settings::Settings;
use crate::host::{Host, TargetRegistry};
use crate::ops::audit::{audit, AuditReport};
use crate::ops::generate::{generate, GenerateResult};

/// The manifest plugin bound to one raw configuration.
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    raw: Value,
    audited: Option<Settings>,
}

impl ManifestPlugin {
    pub fn new(raw: Value) -> Self {
        ManifestPlugin { raw, audited: None }
    }

    /// Validate the settings and keep them for [`ManifestPlugin::exec`].
    pub fn audit<R: TargetRegistry + ?Sized>(&mut self, registry: &R) -> Result<AuditReport> {
        let report = audit(&self.raw, registry)?;
        self.audited = Some(report.settings.clone());
        Ok(report)
    }

    /// The validated settings, validating now if no audit ran.
    pub fn settings(&mut self) -> Result<&Settings> {
        let settings: &Settings = match &mut self.audited {
            Some(settings) => settings,
            slot => slot.insert(Settings::from_value(&self.raw)?),
        };
        Ok(settings)
    }

    /// Run the full pipeline.
    pub fn exec<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<GenerateResult> {
        let settings = self.settings()?;
        generate(settings, host)
    }
}
