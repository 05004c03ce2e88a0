use crate::languages::TypeScriptCollector;
use codegraph_core::{
    AliasMap, AstProvider, CodeGraphError, Edge, ExtractionContext, ImportMap, Node, Result, SourceFile,
};
use sha2::{Digest, Sha256};
use tree_sitter::Parser;

/// A single file's extraction output, prior to the cross-file resolution
/// pass in `pipeline` — nodes, edges (some still carrying `unresolved:`/
/// `unresolved-type:` placeholder targets), and the import/alias maps
/// needed to resolve them (§4.4 "Cross-file resolution").
pub struct FileExtraction {
    pub file_path: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub import_map: ImportMap,
    pub alias_map: AliasMap,
}

/// A file's already-read text, paired with its project-relative path — the
/// `codegraph_core::SourceFile` collaborator implementation this workspace
/// actually feeds to the extractor.
pub struct RawSourceFile {
    pub path: String,
    pub source: String,
}

impl SourceFile for RawSourceFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// The `codegraph_core::AstProvider` implementation backing this crate:
/// parses a [`RawSourceFile`] with tree-sitter's TypeScript grammar and
/// runs [`TypeScriptCollector`] over the resulting tree.
pub struct TypeScriptAstProvider;

impl AstProvider for TypeScriptAstProvider {
    type File = RawSourceFile;

    fn extract_file(&self, file: &Self::File) -> Result<(Vec<Node>, Vec<Edge>, ImportMap, AliasMap)> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|e| CodeGraphError::Parse(format!("failed to load TypeScript grammar: {e}")))?;

        let tree = parser
            .parse(file.source(), None)
            .ok_or_else(|| CodeGraphError::Parse(format!("tree-sitter failed to parse {}", file.path())))?;

        let collector = TypeScriptCollector::new(file.path().to_string(), file.source());
        Ok(collector.collect(tree.root_node()))
    }
}

/// Parses one file's source text and runs the TypeScript collector over
/// it, then fills in each node's `content_hash` from its own declaration
/// span. A pure function of `(context, source)` — no filesystem access, no
/// network — per §4.4's purity requirement; the caller supplies the
/// already-read source text.
pub fn extract_file(context: &ExtractionContext, source: &str) -> Result<FileExtraction> {
    let file = RawSourceFile { path: context.file_path.clone(), source: source.to_string() };
    let (mut nodes, edges, import_map, alias_map) = TypeScriptAstProvider.extract_file(&file)?;

    let lines: Vec<&str> = source.lines().collect();
    for node in &mut nodes {
        node.content_hash = Some(content_hash(&node.kind.to_string(), &node.name, &lines, node.start_line, node.end_line));
    }

    Ok(FileExtraction {
        file_path: context.file_path.clone(),
        nodes,
        edges,
        import_map,
        alias_map,
    })
}

/// Digests a declaration's textual span plus its kind and name, so that
/// two structurally different declarations occupying the same line range
/// (unlikely, but not impossible across reindexing) never collide, and so
/// that an unchanged span always rehashes identically (§3 invariant 6,
/// testable property 3).
fn content_hash(kind: &str, name: &str, lines: &[&str], start_line: u32, end_line: u32) -> String {
    let start = start_line.saturating_sub(1) as usize;
    let end = (end_line as usize).min(lines.len());
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    hasher.update(b":");
    if start < end {
        for line in &lines[start..end] {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
    }
    format!("{:x}", hasher.finalize())
}
