use codegraph_core::{extract_symbol, AliasMap, Edge, EdgeKind, Node};
use std::collections::{HashMap, HashSet};

/// Upper bound and snippet-density knobs shared by every formatted query
/// result (§6.2 `QueryOptions`).
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub max_nodes: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { max_nodes: 50 }
    }
}

/// One line of source within a formatted node's snippet, with an optional
/// call-site marker (`>` prefix, §4.7 Nodes section).
#[derive(Debug, Clone)]
pub struct SnippetLine {
    pub line_no: u32,
    pub text: String,
    pub is_call_site: bool,
}

/// Everything the formatter needs about one node: its metadata plus the
/// call-site line numbers recorded against it (if it's a caller in this
/// result set) and the full source text of its file (for snippet
/// extraction).
pub struct FormatNode<'a> {
    pub node: &'a Node,
    pub call_sites: Vec<(u32, u32)>,
    pub source_lines: Option<Vec<String>>,
}

/// Builds the display name for a node: strips the id down to its dotted
/// symbol (or uses the bare file path for File nodes), then rewrites a
/// leading `ReturnType<typeof X>` prefix to the aliased name per the
/// alias map (§4.1 `build_alias_map`, §4.7 display-name construction step 2).
pub fn display_name(node: &Node, alias_map: &AliasMap) -> String {
    let symbol = extract_symbol(&node.id).unwrap_or(&node.name).to_string();
    for (synthetic, alias) in alias_map {
        if symbol == *synthetic {
            return alias.clone();
        }
        if let Some(rest) = symbol.strip_prefix(&format!("{synthetic}.")) {
            return format!("{alias}.{rest}");
        }
    }
    symbol
}

/// Builds the final display-name table for a node set, disambiguating
/// collisions with `#1`, `#2`, … in insertion order (§4.7 step 3).
pub fn display_names<'a>(nodes: impl Iterator<Item = &'a Node>, alias_map: &AliasMap) -> HashMap<String, String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut result = HashMap::new();
    for node in nodes {
        let base = display_name(node, alias_map);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 { base.clone() } else { format!("{base}#{}", *count) };
        result.insert(node.id.clone(), name);
    }
    // A name that only occurs once should not retain an implicit "#1" —
    // rewrite plain singletons back to the base name.
    let totals: HashMap<&str, usize> = {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for name in result.values() {
            let base = name.split('#').next().unwrap_or(name);
            *totals.entry(base).or_insert(0) += 1;
        }
        totals
    };
    for name in result.values_mut() {
        let base = name.split('#').next().unwrap_or(name).to_string();
        if totals.get(base.as_str()) == Some(&1) {
            *name = base;
        }
    }
    result
}

/// Renders the "## Graph" section: root nodes (appear as source, never as
/// target — or the first edge's source on a cyclic-only subgraph), walked
/// one outgoing edge at a time, branching onto a new line whenever a node
/// has more than one unvisited outgoing edge (§4.7 Graph section).
pub fn render_graph(edges: &[Edge], names: &HashMap<String, String>) -> String {
    if edges.is_empty() {
        return "(no dependencies found)".to_string();
    }

    let mut outgoing: HashMap<&str, Vec<&Edge>> = HashMap::new();
    let mut targets: HashSet<&str> = HashSet::new();
    for edge in edges {
        outgoing.entry(&edge.source_id).or_default().push(edge);
        targets.insert(&edge.target_id);
    }

    let mut roots: Vec<&str> = outgoing
        .keys()
        .filter(|id| !targets.contains(*id))
        .copied()
        .collect();
    if roots.is_empty() {
        roots.push(edges[0].source_id.as_str());
    }
    roots.sort();

    let mut visited: HashSet<(String, String, EdgeKind)> = HashSet::new();
    let mut lines = Vec::new();

    for root in roots {
        walk_chain(root, &outgoing, names, &mut visited, &mut lines);
    }
    // Any edge not reached by a root walk (pure cycle) still needs emitting.
    for edge in edges {
        let key = (edge.source_id.clone(), edge.target_id.clone(), edge.kind);
        if !visited.contains(&key) {
            walk_chain(&edge.source_id, &outgoing, names, &mut visited, &mut lines);
        }
    }

    lines.join("\n")
}

fn walk_chain(
    start: &str,
    outgoing: &HashMap<&str, Vec<&Edge>>,
    names: &HashMap<String, String>,
    visited: &mut HashSet<(String, String, EdgeKind)>,
    lines: &mut Vec<String>,
) {
    let mut current = start.to_string();
    let mut segments: Vec<String> = vec![label(&current, names)];

    loop {
        let Some(candidates) = outgoing.get(current.as_str()) else { break };
        let unvisited: Vec<&&Edge> = candidates
            .iter()
            .filter(|e| !visited.contains(&(e.source_id.clone(), e.target_id.clone(), e.kind)))
            .collect();
        if unvisited.is_empty() {
            break;
        }

        let (first, rest) = unvisited.split_first().unwrap();
        visited.insert((first.source_id.clone(), first.target_id.clone(), first.kind));
        segments.push(format!("--{}-->", first.kind));
        segments.push(label(&first.target_id, names));

        for branch in rest {
            if !visited.contains(&(branch.source_id.clone(), branch.target_id.clone(), branch.kind)) {
                walk_chain(&branch.source_id, outgoing, names, visited, lines);
            }
        }

        current = first.target_id.clone();
    }

    lines.push(segments.join(" "));
}

fn label(id: &str, names: &HashMap<String, String>) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

/// Adaptive snippet context-line count, per §4.7's table keyed on `N`, the
/// number of nodes in the Nodes section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptivePolicy {
    Context(u32),
    Omitted,
    Truncated(usize),
}

pub fn adaptive_policy(n: usize) -> AdaptivePolicy {
    match n {
        0..=5 => AdaptivePolicy::Context(10),
        6..=25 => AdaptivePolicy::Context(((25 - n) / 2) as u32),
        26..=35 => AdaptivePolicy::Context(0),
        36..=50 => AdaptivePolicy::Omitted,
        _ => AdaptivePolicy::Truncated(50),
    }
}

/// Renders the "## Nodes" section for a set of formatted nodes, applying
/// the adaptive context policy uniformly (§4.7 Nodes section + Adaptive
/// context table).
pub fn render_nodes(nodes: &[FormatNode<'_>], names: &HashMap<String, String>) -> String {
    let policy = adaptive_policy(nodes.len());
    let mut out = String::new();

    match policy {
        AdaptivePolicy::Truncated(limit) => {
            out.push_str(&format!("truncated ({limit}/{} nodes displayed)\n\n", nodes.len()));
        }
        AdaptivePolicy::Omitted => {
            out.push_str(&format!("Snippets omitted ({} nodes)\n\n", nodes.len()));
        }
        AdaptivePolicy::Context(_) => {}
    }

    let shown: &[FormatNode<'_>] = match policy {
        AdaptivePolicy::Truncated(limit) => &nodes[..nodes.len().min(limit)],
        _ => nodes,
    };

    for fnode in shown {
        let node = fnode.node;
        let name = names.get(&node.id).cloned().unwrap_or_else(|| node.name.clone());
        out.push_str(&format!("{name}:\n"));
        out.push_str(&format!("  type: {}\n", node.kind));
        out.push_str(&format!("  file: {}\n", node.file_path));
        out.push_str(&format!(
            "  offset: {}, limit: {}\n",
            node.start_line,
            node.end_line.saturating_sub(node.start_line) + 1
        ));

        if let AdaptivePolicy::Context(context) = policy {
            out.push_str("  snippet:\n");
            for line in snippet_lines(fnode, context) {
                let marker = if line.is_call_site { ">" } else { " " };
                out.push_str(&format!("    {marker}{}: {}\n", line.line_no, line.text));
            }
        }
        out.push('\n');
    }
    out
}

/// Snippet extraction policy (§4.7): nodes without recorded call sites get
/// the first `context` lines of their body; nodes with call sites whose
/// body is more than `2 * context` lines get a window around each site,
/// gaps of 2 or fewer intervening lines merged; everything else gets its
/// entire body.
fn snippet_lines(fnode: &FormatNode<'_>, context: u32) -> Vec<SnippetLine> {
    let Some(source_lines) = fnode.source_lines.as_ref() else { return Vec::new() };
    let node = fnode.node;
    let body_len = node.end_line.saturating_sub(node.start_line) + 1;

    let ranges: Vec<(u32, u32)> = if !fnode.call_sites.is_empty() && body_len > 2 * context.max(1) {
        merge_ranges(
            fnode
                .call_sites
                .iter()
                .map(|(start, end)| {
                    (
                        start.saturating_sub(context).max(node.start_line),
                        (end + context).min(node.end_line),
                    )
                })
                .collect(),
        )
    } else if fnode.call_sites.is_empty() {
        vec![(node.start_line, (node.start_line + context.saturating_sub(1)).min(node.end_line))]
    } else {
        vec![(node.start_line, node.end_line)]
    };

    let call_site_lines: HashSet<u32> = fnode
        .call_sites
        .iter()
        .flat_map(|(s, e)| *s..=*e)
        .collect();

    let mut out = Vec::new();
    for (start, end) in ranges {
        for line_no in start..=end {
            let Some(text) = source_lines.get((line_no as usize).saturating_sub(1)) else { continue };
            out.push(SnippetLine {
                line_no,
                text: text.clone(),
                is_call_site: call_site_lines.contains(&line_no),
            });
        }
    }
    out
}

fn merge_ranges(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort();
    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            if start <= last.1.saturating_add(3) {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}
