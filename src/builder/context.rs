//! Per-build context.

use crate::builder::cache_bust::Suffix;

/// Values fixed for the duration of one build.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Cache-busting suffix shared by every busted file of this build
    pub suffix: Suffix,

    /// Development builds never bust
    pub dev: bool,
}

impl RunContext {
    /// Create a context with a freshly drawn suffix.
    pub fn new(dev: bool) -> Self {
        RunContext::with_suffix(Suffix::generate(), dev)
    }

    pub fn with_suffix(suffix: Suffix, dev: bool) -> Self {
        RunContext { suffix, dev }
    }
}
