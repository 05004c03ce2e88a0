use crate::error::Result;
use crate::types::{AliasMap, Edge, ImportMap, Node};

/// A single parsed source file, ready for extraction. Implemented by the
/// tree-sitter-backed provider in `codegraph-parser`; kept as a trait here
/// so `codegraph-core`/`codegraph-query` never depend on tree-sitter
/// directly.
pub trait SourceFile {
    fn path(&self) -> &str;
    fn source(&self) -> &str;
}

/// The AST collaborator the Extractor is built against. Out of scope for
/// this workspace to define a second implementation of, but kept as a
/// trait boundary per the external-interfaces design.
pub trait AstProvider {
    type File: SourceFile;

    /// Parses a single file's text into a provider-specific tree, returning
    /// the node/edge batch for that file plus the import map needed for
    /// cross-file resolution in a later pass.
    fn extract_file(&self, file: &Self::File) -> Result<(Vec<Node>, Vec<Edge>, ImportMap, AliasMap)>;
}

/// The full-text/embedding search collaborator referenced by the
/// Resolver's fuzzy-suggestion step. Out of scope to implement (spec §1);
/// kept as a seam so the Resolver can be built against a trait object and
/// a no-op implementation used in tests.
pub trait SearchProvider {
    fn suggest(&self, query: &str, limit: usize) -> Vec<String>;
}

/// A `SearchProvider` that never suggests anything, used when no external
/// search index is configured.
pub struct NullSearchProvider;

impl SearchProvider for NullSearchProvider {
    fn suggest(&self, _query: &str, _limit: usize) -> Vec<String> {
        Vec::new()
    }
}
