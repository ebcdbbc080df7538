//! High-level operations.
//!
//! This module contains the plugin entry points and the reconciliation
//! engine they drive.

pub mod audit;
pub mod generate;
pub mod plugin;
pub mod reconcile;

pub use audit::{audit, AuditReport};
pub use generate::{generate, generate_with, GenerateResult};
pub use plugin::ManifestPlugin;
pub use reconcile::reconcile;
