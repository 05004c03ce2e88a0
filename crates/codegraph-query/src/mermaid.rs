use crate::format::adaptive_policy;
use codegraph_core::{AliasMap, Edge, EdgeKind, Node, NodeKind};
use std::collections::HashMap;

/// Renders a `graph LR` Mermaid flowchart for the given edge/node set,
/// applying the same adaptive truncation rule as the textual formatter
/// (§4.7 Mermaid section).
pub fn render_mermaid(nodes: &[&Node], edges: &[Edge], alias_map: &AliasMap) -> String {
    let policy = adaptive_policy(nodes.len());
    let (shown_ids, comment): (std::collections::HashSet<String>, Option<String>) = match policy {
        crate::format::AdaptivePolicy::Truncated(limit) => {
            let shown: std::collections::HashSet<String> =
                nodes.iter().take(limit).map(|n| n.id.clone()).collect();
            (shown, Some(format!("%% ({limit}/{} nodes displayed)", nodes.len())))
        }
        _ => (nodes.iter().map(|n| n.id.clone()).collect(), None),
    };

    let mut out = String::new();
    if let Some(comment) = comment {
        out.push_str(&comment);
        out.push('\n');
    }
    out.push_str("graph LR\n");

    let contains_targets: std::collections::HashSet<&str> = edges
        .iter()
        .filter(|e| edge_is_contains(e))
        .map(|e| e.target_id.as_str())
        .collect();

    let mut ids = HashMap::new();
    let mut seen_slugs: HashMap<String, usize> = HashMap::new();
    for node in nodes.iter().filter(|n| shown_ids.contains(&n.id)) {
        let slug = mermaid_id(&node.id, &mut seen_slugs);
        let label = if contains_targets.contains(node.id.as_str()) {
            includes_label(&crate::format::display_name(node, alias_map))
        } else {
            mermaid_label(node, alias_map)
        };
        out.push_str(&format!("  {slug}[\"{label}\"]\n"));
        ids.insert(node.id.clone(), slug);
    }

    for edge in edges {
        if !shown_ids.contains(&edge.source_id) || !shown_ids.contains(&edge.target_id) {
            continue;
        }
        let Some(src) = ids.get(&edge.source_id) else { continue };
        let Some(dst) = ids.get(&edge.target_id) else { continue };
        out.push_str(&format!("  {src} -->|{}| {dst}\n", edge.kind));
    }

    out
}

/// Sanitizes a node id into a valid Mermaid node identifier: any character
/// outside `[a-zA-Z0-9_]` becomes `_`, with a numeric suffix appended if the
/// sanitized form collides with an earlier one.
fn mermaid_id(raw: &str, seen: &mut HashMap<String, usize>) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let count = seen.entry(sanitized.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        sanitized
    } else {
        format!("{sanitized}_{}", *count)
    }
}

fn mermaid_label(node: &Node, alias_map: &AliasMap) -> String {
    let base = crate::format::display_name(node, alias_map);
    let escaped = base.replace('<', "&lt;").replace('>', "&gt;");
    match node.kind {
        NodeKind::Function | NodeKind::Method => format!("{escaped}()"),
        _ => escaped,
    }
}

/// Produces the INCLUDES-style bracketed label form (`&lt;Name&gt;`) used
/// for containment targets in the Mermaid section, kept distinct from the
/// general label builder since only `CONTAINS` targets get this treatment.
pub fn includes_label(name: &str) -> String {
    format!("&lt;{name}&gt;")
}

pub fn edge_is_contains(edge: &Edge) -> bool {
    edge.kind == EdgeKind::Contains
}
