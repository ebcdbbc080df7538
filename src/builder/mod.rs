//! Matrix construction.
//!
//! This module builds the per-build matrix of ref groups and applies
//! cache-busting to the targets it claims.

pub mod cache_bust;
pub mod context;
pub mod matrix;

pub use cache_bust::{apply_suffix, CacheBusting, Suffix};
pub use context::RunContext;
pub use matrix::{build_matrix, MatrixBuilder};
