use codegraph_core::{NullSearchProvider, Node, NodeKind, Result, SearchProvider, DEPENDENCY_RELEVANT_KINDS};
use codegraph_graph::Store;

/// A user-supplied symbol lookup. `symbol` may be simple (`formatDate`) or
/// dotted (`User.save`, `createService.fetchAll`); `file`/`package` narrow
/// the search when given.
#[derive(Debug, Clone, Default)]
pub struct SymbolQuery {
    pub symbol: String,
    pub file: Option<String>,
    pub package: Option<String>,
}

/// Outcome of resolving a [`SymbolQuery`] (§4.5 step 3).
#[derive(Debug, Clone)]
pub enum Disposition {
    NotFound { suggestions: Vec<String> },
    Unique(Node),
    Ambiguous(Vec<Node>),
}

/// Full resolution result: the disposition plus the bookkeeping the
/// formatter needs — whether the class-method fallback fired (prepends a
/// "Resolved X to X.method" line) and whether the file was auto-resolved
/// from a single-file name match (§4.5 step 5).
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub disposition: Disposition,
    pub resolved_from_class: Option<String>,
    pub file_path_was_resolved: bool,
}

/// Resolves one [`SymbolQuery`] against the store, following §4.5 in full:
/// literal lookup, name lookup with `file`/`package` filters, disposition,
/// class-method fallback, and file-path auto-resolution. Fuzzy suggestions
/// are drawn from the store's own name index only — no external search
/// collaborator is configured (§6.3's `SearchProvider` is out of scope per
/// §1); see [`resolve_with_search`] to plug one in.
pub fn resolve(store: &Store, query: &SymbolQuery) -> Result<ResolvedQuery> {
    resolve_with_search(store, query, &NullSearchProvider)
}

/// Same as [`resolve`], but fuzzy `NotFound` suggestions are drawn from
/// `search` first (§6.3's `SearchProvider` collaborator) and topped up with
/// the store's own Levenshtein ranking if the provider returns fewer than
/// five.
pub fn resolve_with_search(
    store: &Store,
    query: &SymbolQuery,
    search: &dyn SearchProvider,
) -> Result<ResolvedQuery> {
    if let Some(file) = &query.file {
        if let Some(node) = literal_lookup(store, file, &query.symbol)? {
            return Ok(ResolvedQuery {
                disposition: Disposition::Unique(node),
                resolved_from_class: None,
                file_path_was_resolved: false,
            });
        }
    }

    let candidates = name_lookup(store, query)?;

    let mut file_path_was_resolved = false;
    let disposition = match candidates.len() {
        0 => Disposition::NotFound {
            suggestions: fuzzy_suggestions(store, &query.symbol, search)?,
        },
        1 => {
            if query.file.is_none() {
                file_path_was_resolved = true;
            }
            Disposition::Unique(candidates.into_iter().next().unwrap())
        }
        _ => Disposition::Ambiguous(candidates),
    };

    let (disposition, resolved_from_class) = apply_class_method_fallback(store, disposition)?;

    Ok(ResolvedQuery {
        disposition,
        resolved_from_class,
        file_path_was_resolved,
    })
}

fn literal_lookup(store: &Store, file: &str, symbol: &str) -> Result<Option<Node>> {
    if let Some(node) = store.get_node(&format!("{file}:{symbol}"))? {
        return Ok(Some(node));
    }
    store.get_node(&format!("{file}:%:{symbol}"))
}

fn name_lookup(store: &Store, query: &SymbolQuery) -> Result<Vec<Node>> {
    let last_segment = query.symbol.rsplit('.').next().unwrap_or(&query.symbol);
    let dotted = query.symbol.contains('.');

    let mut candidates: Vec<Node> = store
        .find_nodes_by_name(last_segment)?
        .into_iter()
        .filter(|n| {
            if dotted && !n.id.ends_with(&format!(":{}", query.symbol)) {
                return false;
            }
            if let Some(file) = &query.file {
                if &n.file_path != file {
                    return false;
                }
            }
            if let Some(package) = &query.package {
                if &n.package != package {
                    return false;
                }
            }
            true
        })
        .collect();

    candidates.sort_by(|a, b| a.file_path.cmp(&b.file_path).then(a.start_line.cmp(&b.start_line)));
    Ok(candidates)
}

/// §4.5 step 4: a unique `Class` hit with no dependency-relevant outgoing
/// edges falls through to its sole dependency-bearing method, if there is
/// exactly one; otherwise the class's methods are listed for disambiguation.
///
/// The letter of the spec is followed exactly here: a class whose implicit
/// constructor happens to emit a `CALLS` edge already has a dependency-
/// relevant outgoing edge, so the fallback does not fire for it — this
/// mirrors the ambiguity the spec itself flags as a possible source bug
/// rather than silently "fixing" it (see DESIGN.md Open Question 1).
fn apply_class_method_fallback(
    store: &Store,
    disposition: Disposition,
) -> Result<(Disposition, Option<String>)> {
    let Disposition::Unique(node) = &disposition else {
        return Ok((disposition, None));
    };
    if node.kind != NodeKind::Class {
        return Ok((disposition, None));
    }

    let adjacency = store.fetch_adjacency(std::slice::from_ref(&node.id), 1)?;
    let has_dependency_edges = adjacency
        .outgoing
        .get(&node.id)
        .map(|edges| edges.iter().any(|e| DEPENDENCY_RELEVANT_KINDS.contains(&e.kind)))
        .unwrap_or(false);
    if has_dependency_edges {
        return Ok((disposition, None));
    }

    let methods = store.find_methods_of_class(&node.file_path, &node.name)?;

    let methods_with_deps: Vec<&Node> = {
        let mut with_deps = Vec::new();
        for method in &methods {
            let method_adj = store.fetch_adjacency(std::slice::from_ref(&method.id), 1)?;
            let has_deps = method_adj
                .outgoing
                .get(&method.id)
                .map(|edges| edges.iter().any(|e| DEPENDENCY_RELEVANT_KINDS.contains(&e.kind)))
                .unwrap_or(false);
            if has_deps {
                with_deps.push(method);
            }
        }
        with_deps
    };

    match methods_with_deps.len() {
        1 => {
            let resolved = methods_with_deps[0].clone();
            let resolved_from = node.name.clone();
            Ok((Disposition::Unique(resolved), Some(resolved_from)))
        }
        _ if methods.is_empty() => Ok((disposition, None)),
        _ => Ok((Disposition::Ambiguous(methods), None)),
    }
}

/// Case-insensitive Levenshtein distance via a rolling two-row DP, used to
/// rank fuzzy suggestions when a symbol resolves to zero candidates.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn fuzzy_suggestions(store: &Store, symbol: &str, search: &dyn SearchProvider) -> Result<Vec<String>> {
    let last_segment = symbol.rsplit('.').next().unwrap_or(symbol);

    let mut names: Vec<String> = search.suggest(last_segment, 5);

    if names.len() < 5 {
        let candidates = store.find_nodes_by_name_substring(last_segment)?;
        let mut scored: Vec<(usize, String)> = candidates
            .into_iter()
            .map(|n| (levenshtein(&n.name, last_segment), n.name))
            .collect();
        scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.dedup_by(|a, b| a.1 == b.1);
        for (_, name) in scored {
            if names.len() >= 5 {
                break;
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names.truncate(5);
    Ok(names)
}
