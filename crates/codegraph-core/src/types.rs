use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A node identity is the deterministic string `file[:Kind:dotted.symbol]`
/// described by the identity scheme, not a random handle. Stability across
/// reindexing passes depends on it being derived purely from source text.
pub type NodeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Function,
    Method,
    Class,
    Interface,
    TypeAlias,
    Variable,
    Property,
    SyntheticType,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::File => "File",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::Class => "Class",
            NodeKind::Interface => "Interface",
            NodeKind::TypeAlias => "TypeAlias",
            NodeKind::Variable => "Variable",
            NodeKind::Property => "Property",
            NodeKind::SyntheticType => "SyntheticType",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "File" => Ok(NodeKind::File),
            "Function" => Ok(NodeKind::Function),
            "Method" => Ok(NodeKind::Method),
            "Class" => Ok(NodeKind::Class),
            "Interface" => Ok(NodeKind::Interface),
            "TypeAlias" => Ok(NodeKind::TypeAlias),
            "Variable" => Ok(NodeKind::Variable),
            "Property" => Ok(NodeKind::Property),
            "SyntheticType" => Ok(NodeKind::SyntheticType),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Calls,
    References,
    Imports,
    Contains,
    Extends,
    Implements,
    UsesType,
    HasProperty,
    HasType,
    Returns,
    AliasFor,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::Calls => "CALLS",
            EdgeKind::References => "REFERENCES",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::UsesType => "USES_TYPE",
            EdgeKind::HasProperty => "HAS_PROPERTY",
            EdgeKind::HasType => "HAS_TYPE",
            EdgeKind::Returns => "RETURNS",
            EdgeKind::AliasFor => "ALIAS_FOR",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CALLS" => Ok(EdgeKind::Calls),
            "REFERENCES" => Ok(EdgeKind::References),
            "IMPORTS" => Ok(EdgeKind::Imports),
            "CONTAINS" => Ok(EdgeKind::Contains),
            "EXTENDS" => Ok(EdgeKind::Extends),
            "IMPLEMENTS" => Ok(EdgeKind::Implements),
            "USES_TYPE" => Ok(EdgeKind::UsesType),
            "HAS_PROPERTY" => Ok(EdgeKind::HasProperty),
            "HAS_TYPE" => Ok(EdgeKind::HasType),
            "RETURNS" => Ok(EdgeKind::Returns),
            "ALIAS_FOR" => Ok(EdgeKind::AliasFor),
            other => Err(format!("unknown edge kind: {other}")),
        }
    }
}

/// Edge kinds that count as "dependency-relevant" for the class-method
/// fallback check in the resolver (§4.5 step 4).
pub const DEPENDENCY_RELEVANT_KINDS: &[EdgeKind] = &[
    EdgeKind::Calls,
    EdgeKind::References,
    EdgeKind::Extends,
    EdgeKind::Implements,
];

/// Edge kinds the impact query unions over (§4.6 `impact`).
pub const IMPACT_KINDS: &[EdgeKind] = &[
    EdgeKind::Calls,
    EdgeKind::References,
    EdgeKind::UsesType,
    EdgeKind::Extends,
    EdgeKind::Implements,
    EdgeKind::HasProperty,
    EdgeKind::HasType,
    EdgeKind::Returns,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeUsageContext {
    Parameter,
    Return,
    Property,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceContext {
    Callback,
    Property,
    Array,
    Return,
    Assignment,
    Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A 1-indexed, inclusive line range within a caller's body where an
/// outgoing call occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

/// Core node record, persisted as one row of the `nodes` table (§3/§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub package: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub exported: bool,
    pub content_hash: Option<String>,
    pub properties: NodeProperties,
}

/// Kind-specific property payload for a [`Node`], carried through the
/// `properties` JSON column. One variant per node kind per §4.4's table,
/// rather than a free-form dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliased_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_const: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// A directed edge between two node IDs, persisted as one row of the
/// `edges` table. `(source_id, target_id, kind)` is the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sites: Option<Vec<LineRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_type_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_symbols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TypeUsageContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_context: Option<ReferenceContext>,
}

impl Edge {
    pub fn new(source_id: impl Into<NodeId>, target_id: impl Into<NodeId>, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
            call_count: None,
            call_sites: None,
            is_type_only: None,
            imported_symbols: None,
            context: None,
            reference_context: None,
        }
    }
}

/// Attributes extracted about a single file, not yet normalized into a
/// [`Node`] batch (used while walking a parse tree).
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub file_path: String,
    pub package: String,
}

/// Map from a named/namespace import's local binding to the resolved
/// absolute file path it points at, plus `*` for namespace imports.
/// Scoped to one file's extraction pass (§4.4 "Cross-file resolution").
pub type ImportMap = HashMap<String, (String, String)>;

/// Map from a synthetic type's symbol (e.g. `ReturnType<typeof createService>`)
/// to the user-facing alias name it stands in for (§4.1 `build_alias_map`).
pub type AliasMap = HashMap<String, String>;
