use crate::format::{display_names, render_graph, render_nodes, FormatNode, QueryOptions};
use crate::mermaid::render_mermaid;
use crate::resolver::{resolve, Disposition, SymbolQuery};
use codegraph_core::{build_alias_map, extract_symbol, Edge, EdgeKind, Node, Result};
use codegraph_graph::{traversal, Store};
use std::collections::HashMap;
use std::path::Path;

/// How a query's result should be rendered (§4.7's two output forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Mermaid,
}

/// Either a successful rendering or one of the byte-stable early-exit
/// strings the external interface fixes (§6.4): `No dependencies found.`,
/// `No path found.`, `Symbol not found: <id>`, `(no symbols found)`.
pub type QueryOutput = String;

/// A symbol reference used by `paths_between` and multi-seed queries:
/// `file_path` narrows the lookup, `symbol` is required (§6.2 `SymbolRef`).
#[derive(Debug, Clone)]
pub struct SymbolRef {
    pub file_path: Option<String>,
    pub symbol: String,
}

/// `dependencies_of(store, project_root, file, symbol, opts)`: resolves
/// `symbol` in `file`, then renders its forward-reachable subgraph.
pub fn dependencies_of(
    store: &Store,
    project_root: &Path,
    file: &str,
    symbol: &str,
    depth: usize,
    opts: QueryOptions,
    format: OutputFormat,
) -> Result<QueryOutput> {
    let query = SymbolQuery { symbol: symbol.to_string(), file: Some(file.to_string()), package: None };
    let resolved = resolve(store, &query)?;
    let Some(node) = resolved_node(&resolved) else {
        return Ok(render_unresolved(&resolved, symbol));
    };

    let edges = traversal::dependency_edges(store, &node.id, depth)?;
    render_traversal_result(store, project_root, &resolved, node, edges.into_iter().map(|e| e.edge).collect(), opts, format, "No dependencies found.")
}

/// `dependents_of(store, project_root, file, symbol, opts)`: resolves
/// `symbol` in `file`, then renders its backward-reachable subgraph.
pub fn dependents_of(
    store: &Store,
    project_root: &Path,
    file: &str,
    symbol: &str,
    depth: usize,
    opts: QueryOptions,
    format: OutputFormat,
) -> Result<QueryOutput> {
    let query = SymbolQuery { symbol: symbol.to_string(), file: Some(file.to_string()), package: None };
    let resolved = resolve(store, &query)?;
    let Some(node) = resolved_node(&resolved) else {
        return Ok(render_unresolved(&resolved, symbol));
    };

    let edges = traversal::dependent_edges(store, &node.id, depth)?;
    render_traversal_result(store, project_root, &resolved, node, edges.into_iter().map(|e| e.edge).collect(), opts, format, "No dependents found.")
}

/// `paths_between(store, project_root, from, to, opts)`: forward search
/// first; per §4.6's bidirectional policy, `shortest_path` itself falls
/// back to the reverse direction when no forward path exists, so this
/// entry point just resolves both endpoints and delegates.
pub fn paths_between(
    store: &Store,
    project_root: &Path,
    from: &SymbolRef,
    to: &SymbolRef,
    depth: usize,
    opts: QueryOptions,
    format: OutputFormat,
) -> Result<QueryOutput> {
    let from_query = SymbolQuery { symbol: from.symbol.clone(), file: from.file_path.clone(), package: None };
    let to_query = SymbolQuery { symbol: to.symbol.clone(), file: to.file_path.clone(), package: None };

    let from_resolved = resolve(store, &from_query)?;
    let Some(from_node) = resolved_node(&from_resolved) else {
        return Ok(render_unresolved(&from_resolved, &from.symbol));
    };
    let to_resolved = resolve(store, &to_query)?;
    let Some(to_node) = resolved_node(&to_resolved) else {
        return Ok(render_unresolved(&to_resolved, &to.symbol));
    };

    let Some(path) = traversal::shortest_path(store, &from_node.id, &to_node.id, depth)? else {
        return Ok("No path found.".to_string());
    };

    let nodes = load_nodes_for_edges(store, &path.edges, &[from_node.clone(), to_node.clone()])?;
    render_output(store, project_root, &path.edges, &nodes, opts, format, "No path found.", None)
}

/// `search_graph(store, { from? | to? | topic?, max_nodes? })`: connects a
/// set of seed nodes into a small subgraph via `connect_seeds`. `topic`-only
/// queries would defer to an external search collaborator (§6.2) — not
/// wired here since that collaborator is explicitly out of scope (§1).
pub fn search_graph(
    store: &Store,
    project_root: &Path,
    seeds: &[SymbolRef],
    depth: usize,
    opts: QueryOptions,
    format: OutputFormat,
) -> Result<QueryOutput> {
    let mut seed_ids = Vec::new();
    for seed in seeds {
        let query = SymbolQuery { symbol: seed.symbol.clone(), file: seed.file_path.clone(), package: None };
        let resolved = resolve(store, &query)?;
        let Some(node) = resolved_node(&resolved) else {
            return Ok(render_unresolved(&resolved, &seed.symbol));
        };
        seed_ids.push(node.id.clone());
    }

    let paths = traversal::connect_seeds(store, &seed_ids, depth)?;
    let edges: Vec<Edge> = paths.into_iter().flat_map(|p| p.edges).collect();
    if edges.is_empty() {
        return Ok("(no symbols found)".to_string());
    }

    let nodes = load_nodes_for_edges(store, &edges, &[])?;
    render_output(store, project_root, &edges, &nodes, opts, format, "(no symbols found)", None)
}

fn resolved_node(resolved: &crate::resolver::ResolvedQuery) -> Option<&Node> {
    match &resolved.disposition {
        Disposition::Unique(node) => Some(node),
        _ => None,
    }
}

fn render_unresolved(resolved: &crate::resolver::ResolvedQuery, symbol: &str) -> String {
    match &resolved.disposition {
        Disposition::NotFound { suggestions } => {
            if suggestions.is_empty() {
                format!("Symbol not found: {symbol}")
            } else {
                format!("Symbol not found: {symbol}\nDid you mean: {}", suggestions.join(", "))
            }
        }
        Disposition::Ambiguous(candidates) => {
            let listing: Vec<String> = candidates
                .iter()
                .map(|n| format!("  {} ({}:{})", n.id, n.file_path, n.start_line))
                .collect();
            format!("Ambiguous symbol: {symbol}\n{}", listing.join("\n"))
        }
        Disposition::Unique(_) => unreachable!("render_unresolved called on a Unique disposition"),
    }
}

fn render_traversal_result(
    store: &Store,
    project_root: &Path,
    resolved: &crate::resolver::ResolvedQuery,
    node: &Node,
    edges: Vec<Edge>,
    opts: QueryOptions,
    format: OutputFormat,
    empty_message: &str,
) -> Result<QueryOutput> {
    let mut nodes = load_nodes_for_edges(store, &edges, &[node.clone()])?;
    if nodes.iter().all(|n| n.id != node.id) {
        nodes.push(node.clone());
    }

    let prefix = resolved.resolved_from_class.as_ref().map(|class| {
        format!("Resolved '{class}' to {}\n\n", extract_symbol(&node.id).unwrap_or(&node.name))
    });

    render_output(store, project_root, &edges, &nodes, opts, format, empty_message, prefix)
}

fn render_output(
    store: &Store,
    project_root: &Path,
    edges: &[Edge],
    nodes: &[Node],
    opts: QueryOptions,
    format: OutputFormat,
    empty_message: &str,
    prefix: Option<String>,
) -> Result<QueryOutput> {
    if edges.is_empty() && nodes.is_empty() {
        return Ok(empty_message.to_string());
    }

    let alias_map = build_alias_map(alias_pairs(store, edges, nodes)?);
    let names = display_names(nodes.iter(), &alias_map);

    let body = match format {
        OutputFormat::Text => {
            let graph_section = render_graph(edges, &names);
            let limited: Vec<&Node> = nodes.iter().take(opts.max_nodes.max(1)).collect();
            let format_nodes = build_format_nodes(project_root, &limited, edges);
            let nodes_section = render_nodes(&format_nodes, &names);
            format!("## Graph\n{graph_section}\n\n## Nodes\n{nodes_section}")
        }
        OutputFormat::Mermaid => {
            let refs: Vec<&Node> = nodes.iter().collect();
            render_mermaid(&refs, edges, &alias_map)
        }
    };

    Ok(match prefix {
        Some(prefix) => format!("{prefix}{body}"),
        None => body,
    })
}

fn alias_pairs(store: &Store, edges: &[Edge], nodes: &[Node]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    for edge in edges.iter().filter(|e| e.kind == EdgeKind::AliasFor) {
        let source = match by_id.get(edge.source_id.as_str()) {
            Some(n) => Some((*n).clone()),
            None => store.get_node(&edge.source_id)?,
        };
        let target = match by_id.get(edge.target_id.as_str()) {
            Some(n) => Some((*n).clone()),
            None => store.get_node(&edge.target_id)?,
        };
        if let (Some(source), Some(target)) = (source, target) {
            pairs.push((target.name.clone(), extract_symbol(&source.id).unwrap_or(&source.name).to_string()));
        }
    }
    Ok(pairs)
}

fn load_nodes_for_edges(store: &Store, edges: &[Edge], extra: &[Node]) -> Result<Vec<Node>> {
    let mut ids: Vec<String> = Vec::new();
    for edge in edges {
        ids.push(edge.source_id.clone());
        ids.push(edge.target_id.clone());
    }
    for node in extra {
        ids.push(node.id.clone());
    }
    ids.sort();
    ids.dedup();

    let mut by_id: HashMap<String, Node> = extra.iter().map(|n| (n.id.clone(), n.clone())).collect();
    for id in ids {
        if by_id.contains_key(&id) {
            continue;
        }
        if let Some(node) = store.get_node(&id)? {
            by_id.insert(id, node);
        }
    }
    let mut nodes: Vec<Node> = by_id.into_values().collect();
    nodes.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.start_line.cmp(&b.start_line)));
    Ok(nodes)
}

fn build_format_nodes<'a>(project_root: &Path, nodes: &[&'a Node], edges: &[Edge]) -> Vec<FormatNode<'a>> {
    let mut call_sites: HashMap<&str, Vec<(u32, u32)>> = HashMap::new();
    for edge in edges.iter().filter(|e| e.kind == EdgeKind::Calls) {
        if let Some(sites) = &edge.call_sites {
            call_sites
                .entry(edge.source_id.as_str())
                .or_default()
                .extend(sites.iter().map(|r| (r.start_line, r.end_line)));
        }
    }

    let mut source_cache: HashMap<String, Vec<String>> = HashMap::new();
    nodes
        .iter()
        .map(|node| {
            let lines = source_cache.entry(node.file_path.clone()).or_insert_with(|| {
                std::fs::read_to_string(project_root.join(&node.file_path))
                    .map(|text| text.lines().map(str::to_string).collect())
                    .unwrap_or_default()
            });
            FormatNode {
                node,
                call_sites: call_sites.get(node.id.as_str()).cloned().unwrap_or_default(),
                source_lines: if lines.is_empty() { None } else { Some(lines.clone()) },
            }
        })
        .collect()
}
