use crate::extractor::{self, FileExtraction};
use crate::file_collect::collect_project_files;
use codegraph_core::{normalize_path, CodeGraphError, Edge, EdgeKind, ExtractionContext, IndexerConfig, Result};
use codegraph_graph::Store;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of one `ingest_project` run: how many files were (re)indexed,
/// how many were skipped via the content-hash short-circuit, and the
/// per-file errors collected along the way (§4.8 step 5 — a parse/IO
/// failure on one file never aborts the rest of the project).
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub indexed_files: usize,
    pub skipped_files: usize,
    pub errors: Vec<(String, String)>,
}

/// Runs a full project ingestion: discovers source files under
/// `config.project_root`, extracts each in parallel, applies the
/// content-hash short-circuit per file, and writes the changed files'
/// nodes and edges to `store` with cross-file placeholder targets
/// resolved against the whole batch (§4.8).
pub fn ingest_project(store: &Store, config: &IndexerConfig) -> Result<IngestionReport> {
    let files = collect_project_files(&config.project_root, &config.include_globs, &config.exclude_globs);
    info!("discovered {} candidate files", files.len());

    let extractions: Vec<(String, Result<FileExtraction>)> = files
        .par_iter()
        .map(|path| {
            let relative = normalize_path(&path.strip_prefix(&config.project_root).unwrap_or(path).to_string_lossy());
            let result = std::fs::read_to_string(path)
                .map_err(CodeGraphError::from)
                .and_then(|source| {
                    let context = ExtractionContext {
                        file_path: relative.clone(),
                        package: package_of(&relative),
                    };
                    extractor::extract_file(&context, &source)
                });
            (relative, result)
        })
        .collect();

    let mut report = IngestionReport::default();
    let mut changed: Vec<FileExtraction> = Vec::new();

    for (path, result) in extractions {
        match result {
            Ok(extraction) => {
                if file_unchanged(store, &extraction)? {
                    report.skipped_files += 1;
                } else {
                    changed.push(extraction);
                }
            }
            Err(e) => {
                warn!("failed to extract {path}: {e}");
                report.errors.push((path, e.to_string()));
            }
        }
    }

    report.indexed_files = changed.len();
    write_batch(store, changed)?;
    Ok(report)
}

/// Re-extracts and re-writes a single file, invalidating its previous
/// nodes/edges first — the incremental path a file watcher would call on
/// a single changed file instead of a full `ingest_project` pass.
pub fn reingest_file(store: &Store, project_root: &Path, file_path: &str) -> Result<()> {
    let absolute = project_root.join(file_path);
    let source = std::fs::read_to_string(&absolute)?;
    let context = ExtractionContext {
        file_path: file_path.to_string(),
        package: package_of(file_path),
    };
    let extraction = extractor::extract_file(&context, &source)?;
    write_batch(store, vec![extraction])
}

/// Drops the entire graph and re-ingests the project from scratch —
/// `index --full` / the "on full-project clear" path in §4.8 step 4.
pub fn reindex_all(store: &Store, config: &IndexerConfig) -> Result<IngestionReport> {
    store.clear_all()?;
    ingest_project(store, config)
}

/// Deletes a file's nodes (and anything still pointing at it) from the
/// store — called when a file has been removed from the project entirely.
pub fn remove_file(store: &Store, file_path: &str) -> Result<()> {
    store.delete_file(file_path)
}

/// Testable property 3 / §4.8 step 2: if every node's `content_hash` in
/// a freshly extracted file matches what's already stored for that file,
/// the file can be skipped — its edges are necessarily unchanged too
/// since extraction is a pure function of the source text.
fn file_unchanged(store: &Store, extraction: &FileExtraction) -> Result<bool> {
    let previous = store.node_content_hashes(&extraction.file_path)?;
    if previous.is_empty() {
        return Ok(false);
    }
    if previous.len() != extraction.nodes.len() {
        return Ok(false);
    }
    for node in &extraction.nodes {
        match previous.get(&node.id) {
            Some(hash) if hash == &node.content_hash => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Writes a batch of changed files: invalidates each file's previous
/// nodes, inserts every new node (across all files, before any edges —
/// §5 ordering guarantee), then resolves cross-file placeholder targets
/// against the now-current store and inserts the resolved edges.
fn write_batch(store: &Store, files: Vec<FileExtraction>) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    for file in &files {
        store.remove_file_nodes(&file.file_path)?;
    }

    let all_nodes: Vec<_> = files.iter().flat_map(|f| f.nodes.clone()).collect();
    store.add_nodes(&all_nodes)?;

    let mut resolved_edges = Vec::new();
    for file in &files {
        for edge in &file.edges {
            if let Some(edge) = resolve_edge(store, file, edge)? {
                resolved_edges.push(edge);
            }
        }
    }
    store.add_edges(&resolved_edges)?;
    Ok(())
}

/// Resolves one edge's placeholder target (`unresolved:name` or
/// `unresolved-type:name`, emitted by the per-file collector) to a
/// concrete node id, per §4.4's cross-file resolution: same-file name
/// match first, then the file's own import map, else the edge is dropped
/// — "symbols not resolvable... are skipped" (the chosen half of the
/// spec's either/or, see DESIGN.md).
fn resolve_edge(store: &Store, file: &FileExtraction, edge: &Edge) -> Result<Option<Edge>> {
    let (is_placeholder, name) = match edge.target_id.strip_prefix("unresolved-type:") {
        Some(name) => (true, name),
        None => match edge.target_id.strip_prefix("unresolved:") {
            Some(name) => (true, name),
            None => (false, edge.target_id.as_str()),
        },
    };
    if !is_placeholder {
        return Ok(Some(edge.clone()));
    }

    let type_edge = matches!(
        edge.kind,
        EdgeKind::UsesType | EdgeKind::HasProperty | EdgeKind::HasType | EdgeKind::Returns
    );

    if let Some(local) = file.nodes.iter().find(|n| n.name == name && kind_matches(n.kind, type_edge)) {
        let mut resolved = edge.clone();
        resolved.target_id = local.id.clone();
        return Ok(Some(resolved));
    }

    if let Some((resolved_file, imported_symbol)) = file.import_map.get(name) {
        let lookup_name = if imported_symbol == "*" { name } else { imported_symbol };
        if let Some(target) = store.find_node_by_name_in_file(resolved_file, lookup_name)? {
            let mut resolved = edge.clone();
            resolved.target_id = target.id;
            return Ok(Some(resolved));
        }
    }

    if let Some(target) = store.find_node_by_name_in_file(&file.file_path, name)? {
        let mut resolved = edge.clone();
        resolved.target_id = target.id;
        return Ok(Some(resolved));
    }

    Ok(None)
}

fn kind_matches(kind: codegraph_core::NodeKind, type_edge: bool) -> bool {
    use codegraph_core::NodeKind::*;
    if type_edge {
        matches!(kind, Class | Interface | TypeAlias)
    } else {
        matches!(kind, Function | Method)
    }
}

fn package_of(file_path: &str) -> String {
    file_path
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("root")
        .to_string()
}
