pub mod config;
pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

pub use config::IndexerConfig;
pub use error::{CodeGraphError, Result};
pub use ids::{
    build_alias_map, extract_file, extract_symbol, id_lookup_pattern, make_id, normalize_path,
    normalize_type_text, relative_to_root,
};
pub use traits::{AstProvider, NullSearchProvider, SearchProvider, SourceFile};
pub use types::{
    AliasMap, Edge, EdgeKind, ImportMap, LineRange, Node, NodeId, NodeKind, NodeProperties,
    Parameter, ReferenceContext, TypeUsageContext, Visibility, DEPENDENCY_RELEVANT_KINDS,
    IMPACT_KINDS,
};
