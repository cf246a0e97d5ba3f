//! Per-unit summary of what the engine did.

use crate::error::RewriteConflict;
use crate::model::UnrecognizedShape;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    /// Decoration sites found, opaque ones included.
    pub sites: usize,
    /// Sites left untouched because their shape was not recognized, by offset.
    pub opaque: Vec<(u32, UnrecognizedShape)>,
    pub entries_dropped: usize,
    pub entries_rewritten: usize,
    /// Sites removed as whole statements.
    pub sites_collapsed: usize,
    /// Sites whose edits failed validation and were emitted unmodified, by offset.
    pub rolled_back: Vec<(u32, RewriteConflict)>,
}

impl SimplifyReport {
    pub fn changed(&self) -> bool {
        self.entries_dropped > 0 || self.entries_rewritten > 0
    }

    /// Fold another unit's report into this one.
    pub fn absorb(&mut self, other: &SimplifyReport) {
        self.sites += other.sites;
        self.opaque.extend(other.opaque.iter().cloned());
        self.entries_dropped += other.entries_dropped;
        self.entries_rewritten += other.entries_rewritten;
        self.sites_collapsed += other.sites_collapsed;
        self.rolled_back.extend(other.rolled_back.iter().cloned());
    }
}

impl std::fmt::Display for SimplifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sites, {} metadata entries dropped, {} entries rewritten, {} sites collapsed, {} opaque, {} rolled back",
            self.sites,
            self.entries_dropped,
            self.entries_rewritten,
            self.sites_collapsed,
            self.opaque.len(),
            self.rolled_back.len()
        )
    }
}
