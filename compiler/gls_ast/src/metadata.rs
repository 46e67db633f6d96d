//! Per-unit side tables supplied by the external parser and preprocessor.
//!
//! The grammar parser and the directive preprocessor are separate programs;
//! their output reaches this toolchain as offset-indexed tables next to the
//! tree. Offset-keyed maps are `BTreeMap` so merging back into regenerated
//! text happens in deterministic offset order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::marker::ExtensionBehavior;

/// One `#extension` directive occurrence.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExtensionUse {
    pub name: String,
    pub behavior: ExtensionBehavior,
}

/// Import/export contract declared by an include file.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Names the include offers to its consumers.
    #[serde(default)]
    pub exports: Vec<String>,
    /// Names the include expects its consumers to provide.
    #[serde(default)]
    pub imports: Vec<String>,
}

/// Externally-synthesized node-graph metadata attached to one graph node.
///
/// Regenerated by the translator as plain-text directive lines, grouped and
/// ordered per node name.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct GraphNodeMeta {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub params: Vec<String>,
    /// Condition snippets; identifier occurrences are patched after
    /// obfuscation so they keep referring to the renamed program.
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub raw_lines: Vec<String>,
}

/// All side tables for one compilation unit.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct UnitMetadata {
    /// Include name -> source ranges it was spliced into.
    #[serde(default)]
    pub include_positions: BTreeMap<String, Vec<(u32, u32)>>,
    /// Offset -> extension directive at that offset.
    #[serde(default)]
    pub extensions: BTreeMap<u32, ExtensionUse>,
    /// Include name -> declared contract.
    #[serde(default)]
    pub import_export: BTreeMap<String, ContractSpec>,
    /// Host-supplied identifiers that are additionally off limits.
    #[serde(default)]
    pub reserved_idents: Vec<String>,
    /// Offset -> verbatim directive/comment text to re-emit at that offset.
    #[serde(default)]
    pub directives: BTreeMap<u32, String>,
    /// Verbatim payloads referenced by `@protect <index>` markers.
    #[serde(default)]
    pub protected: Vec<String>,
    /// Node-graph metadata to re-expand after the tree passes.
    #[serde(default)]
    pub graph_nodes: Vec<GraphNodeMeta>,
}

impl UnitMetadata {
    /// Directive entries with offsets in `gap` (half-open), offset order.
    pub fn directives_in(&self, gap: std::ops::Range<u32>) -> impl Iterator<Item = (u32, &str)> {
        self.directives
            .range(gap)
            .map(|(&off, text)| (off, text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn directive_gap_query_is_offset_ordered() {
        let mut meta = UnitMetadata::default();
        meta.directives.insert(40, "#define B".into());
        meta.directives.insert(10, "#define A".into());
        meta.directives.insert(90, "#define C".into());

        let hits: Vec<_> = meta.directives_in(0..50).collect();
        assert_eq!(hits, vec![(10, "#define A"), (40, "#define B")]);
    }
}
