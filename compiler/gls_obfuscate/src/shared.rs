//! Cross-file rename coordination.
//!
//! One table lives in the build context and survives across compilation
//! units. Two kinds of records keep renames consistent between files:
//! include counter ranges, so a re-encountered include replays the exact
//! counter positions its first processing claimed, and varying renames, so
//! a varying shared between vertex and fragment shaders keeps one name.

use std::collections::BTreeMap;

/// Build-scoped shared identifier records.
#[derive(Clone, Debug, Default)]
pub struct SharedNameTable {
    /// Include name -> `(start, end]` counter range claimed at first full
    /// processing.
    include_ranges: BTreeMap<String, (u64, u64)>,
    /// Varying original name -> recorded rename.
    varyings: BTreeMap<String, String>,
}

impl SharedNameTable {
    /// The counter range recorded for an include, if it was processed before.
    pub fn include_range(&self, include: &str) -> Option<(u64, u64)> {
        self.include_ranges.get(include).copied()
    }

    /// Record an include's claimed counter range. First writer wins.
    pub fn record_include(&mut self, include: &str, start: u64, end: u64) {
        self.include_ranges
            .entry(include.to_owned())
            .or_insert((start, end));
    }

    /// Every recorded range, for blocking fresh module-level mints.
    pub fn claimed_ranges(&self) -> Vec<(u64, u64)> {
        self.include_ranges.values().copied().collect()
    }

    /// The recorded rename for a varying, if any file renamed it already.
    pub fn varying(&self, original: &str) -> Option<&str> {
        self.varyings.get(original).map(String::as_str)
    }

    /// Record a varying rename. First writer wins.
    pub fn record_varying(&mut self, original: &str, renamed: &str) {
        self.varyings
            .entry(original.to_owned())
            .or_insert_with(|| renamed.to_owned());
    }

    /// Every recorded varying rename. A later file must treat these as
    /// taken from the start: its varying declarations reuse them verbatim,
    /// wherever in the file they appear.
    pub fn varying_renames(&self) -> impl Iterator<Item = &str> {
        self.varyings.values().map(String::as_str)
    }
}
