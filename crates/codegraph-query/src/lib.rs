pub mod format;
pub mod mermaid;
pub mod query;
pub mod resolver;

pub use format::QueryOptions;
pub use query::{dependencies_of, dependents_of, paths_between, search_graph, OutputFormat, SymbolRef};
pub use resolver::{resolve, resolve_with_search, Disposition, ResolvedQuery, SymbolQuery};
