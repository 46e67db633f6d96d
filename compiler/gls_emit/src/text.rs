//! Final textual pass.
//!
//! Runs on the regenerated source after the tree has been emitted:
//! `@remove` spans are stripped, `@protect` markers are replaced by their
//! verbatim payloads, and graph-node metadata is expanded back into
//! plain-text directive lines.

use gls_ast::{GraphNodeMeta, Marker, UnitMetadata};

/// Apply the marker-driven rewrites and append the graph-node directives.
pub fn apply_text_markers(source: &str, metadata: &UnitMetadata) -> String {
    let mut out = String::new();
    let mut removing = false;
    for line in source.lines() {
        let marker = line
            .trim_start()
            .strip_prefix("//")
            .and_then(|comment| Marker::parse(comment.trim()).ok().flatten());
        match marker {
            Some(Marker::RemoveBegin) => {
                removing = true;
                continue;
            }
            Some(Marker::RemoveEnd) => {
                removing = false;
                continue;
            }
            Some(Marker::Protect(index)) => {
                if !removing {
                    if let Some(payload) = metadata.protected.get(index) {
                        out.push_str(payload);
                        if !payload.ends_with('\n') {
                            out.push('\n');
                        }
                    }
                }
                continue;
            }
            _ => {}
        }
        if !removing {
            out.push_str(line);
            out.push('\n');
        }
    }
    expand_graph_nodes(&mut out, &metadata.graph_nodes);
    out
}

/// Graph-node metadata as `//>` directive lines, grouped per node name.
fn expand_graph_nodes(out: &mut String, nodes: &[GraphNodeMeta]) {
    let mut sorted: Vec<&GraphNodeMeta> = nodes.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for node in sorted {
        let name = &node.name;
        for input in &node.inputs {
            out.push_str(&format!("//> node {name} input {input}\n"));
        }
        for output in &node.outputs {
            out.push_str(&format!("//> node {name} output {output}\n"));
        }
        for param in &node.params {
            out.push_str(&format!("//> node {name} param {param}\n"));
        }
        for condition in &node.conditions {
            out.push_str(&format!("//> node {name} if {condition}\n"));
        }
        for raw in &node.raw_lines {
            out.push_str(raw);
            out.push('\n');
        }
    }
}
