use codegraph_core::ids::{make_id, normalize_type_text};
use codegraph_core::{
    AliasMap, Edge, EdgeKind, ImportMap, LineRange, Node, NodeKind, NodeProperties, Parameter,
    ReferenceContext, TypeUsageContext, Visibility,
};
use tree_sitter::{Node as TsNode, TreeCursor};

/// Walks a parsed TypeScript source file with a manual [`TreeCursor`],
/// collecting declaration nodes and the edges between them. One instance
/// is used per file; `collect` drives the walk and returns the batch plus
/// the file's own import map and alias map for the cross-file resolution
/// pass the ingestion driver performs afterward.
pub struct TypeScriptCollector<'a> {
    source: &'a str,
    file_path: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    import_map: ImportMap,
    alias_map: AliasMap,
    /// Dotted symbol-path prefix stack: `["Foo"]` while inside class `Foo`,
    /// `["Foo", "bar"]` while inside method `bar` of class `Foo`.
    symbol_stack: Vec<String>,
    /// Id of the function/method node whose body is currently being
    /// walked, used to anchor `CALLS`/`REFERENCES` edges.
    enclosing_callable: Vec<String>,
    /// Local bindings of the form `const alias = target;` (plain identifier
    /// initializer, not a call or function expression), used to resolve a
    /// call through the alias to its underlying declaration rather than
    /// emitting an edge to the alias variable itself (§4.4 CALLS rule, S2).
    local_aliases: std::collections::HashMap<String, String>,
}

impl<'a> TypeScriptCollector<'a> {
    pub fn new(file_path: impl Into<String>, source: &'a str) -> Self {
        Self {
            source,
            file_path: file_path.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            import_map: ImportMap::new(),
            alias_map: AliasMap::new(),
            symbol_stack: Vec::new(),
            enclosing_callable: Vec::new(),
            local_aliases: std::collections::HashMap::new(),
        }
    }

    /// Resolves `name` through zero or more `local_aliases` hops to the
    /// ultimate bare identifier a call through it should target.
    fn resolve_alias<'b>(&'b self, name: &'b str) -> &'b str {
        let mut current = name;
        let mut seen = std::collections::HashSet::new();
        while let Some(target) = self.local_aliases.get(current) {
            if !seen.insert(current) {
                break;
            }
            current = target;
        }
        current
    }

    pub fn collect(mut self, root: TsNode<'a>) -> (Vec<Node>, Vec<Edge>, ImportMap, AliasMap) {
        let file_id = make_id(&self.file_path, None, None);
        self.nodes.push(Node {
            id: file_id,
            kind: NodeKind::File,
            name: self.file_path.rsplit('/').next().unwrap_or(&self.file_path).to_string(),
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line: 1,
            end_line: root.end_position().row as u32 + 1,
            exported: false,
            content_hash: None,
            properties: NodeProperties::default(),
        });

        let mut cursor = root.walk();
        self.walk(&mut cursor);
        let edges = merge_call_edges(self.edges);
        (self.nodes, edges, self.import_map, self.alias_map)
    }

    fn walk(&mut self, cursor: &mut TreeCursor<'a>) {
        let node = cursor.node();
        let mut descended = false;

        match node.kind() {
            "import_statement" => {
                self.handle_import(node);
            }
            "function_declaration" => {
                self.handle_function(node, false);
            }
            "method_definition" => {
                self.handle_function(node, true);
            }
            "class_declaration" => {
                self.handle_class(node);
                descended = true;
            }
            "public_field_definition" | "field_definition" => {
                self.handle_class_property(node);
            }
            "object_method" if self.in_exported_object_literal(node) => {
                self.handle_function(node, true);
                descended = true;
            }
            "interface_declaration" => {
                self.handle_interface(node);
            }
            "type_alias_declaration" => {
                self.handle_type_alias(node);
            }
            "lexical_declaration" | "variable_statement" => {
                self.handle_variable_statement(node);
            }
            "call_expression" => {
                self.handle_call(node);
            }
            _ => {}
        }

        if !descended && cursor.goto_first_child() {
            loop {
                self.walk(cursor);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn node_text(&self, node: TsNode<'a>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn child_text_by_field(&self, node: TsNode<'a>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.node_text(n))
    }

    fn location(&self, node: TsNode<'a>) -> (u32, u32) {
        (
            node.start_position().row as u32 + 1,
            node.end_position().row as u32 + 1,
        )
    }

    fn current_symbol_path(&self, name: &str) -> String {
        if self.symbol_stack.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.symbol_stack.join("."), name)
        }
    }

    fn is_exported(&self, node: TsNode<'a>) -> bool {
        node.parent()
            .map(|p| p.kind() == "export_statement")
            .unwrap_or(false)
    }

    fn handle_import(&mut self, node: TsNode<'a>) {
        let Some(source_node) = node
            .child_by_field_name("source")
            .or_else(|| find_child_of_kind(node, "string"))
        else {
            return;
        };
        let raw = self.node_text(source_node);
        let specifier = raw.trim_matches(|c| c == '"' || c == '\'');
        if !specifier.starts_with('.') {
            // External package import; not resolvable to a project file.
            return;
        }
        let resolved = resolve_relative_import(&self.file_path, specifier);

        let file_id = make_id(&self.file_path, None, None);
        let target_file_id = make_id(&resolved, None, None);
        let mut edge = Edge::new(file_id, target_file_id, EdgeKind::Imports);

        let mut imported_symbols = Vec::new();
        let mut cursor = node.walk();
        let mut reached_clause = false;
        for child in node.children(&mut cursor) {
            if child.kind() == "import_clause" {
                reached_clause = true;
                collect_import_bindings(self.source, child, &resolved, &mut self.import_map, &mut imported_symbols);
            }
        }
        let _ = reached_clause;

        edge.imported_symbols = if imported_symbols.is_empty() {
            None
        } else {
            Some(imported_symbols)
        };
        edge.is_type_only = Some(self.node_text(node).trim_start().starts_with("import type"));
        self.edges.push(edge);
    }

    fn handle_function(&mut self, node: TsNode<'a>, is_method: bool) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let kind = if is_method { NodeKind::Method } else { NodeKind::Function };
        let id = make_id(&self.file_path, Some(kind), Some(&symbol));

        let parameters = self.extract_parameters(node);
        let return_type = self
            .child_text_by_field(node, "return_type")
            .map(|t| normalize_type_text(t.trim_start_matches(':')));
        let is_async = self.node_text(node).trim_start().starts_with("async");
        let is_static = self.node_text(node).contains("static ");

        let properties = NodeProperties {
            parameters: Some(parameters.clone()),
            return_type: return_type.clone(),
            is_async: Some(is_async),
            is_static: if is_method { Some(is_static) } else { None },
            visibility: if is_method { Some(visibility_of(self.node_text(node))) } else { None },
            ..Default::default()
        };

        self.nodes.push(Node {
            id: id.clone(),
            kind,
            name: name.clone(),
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: if is_method {
                matches!(properties.visibility, Some(Visibility::Public))
            } else {
                self.is_exported(node)
            },
            content_hash: None,
            properties,
        });

        self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));

        for param in &parameters {
            if let Some(ty) = &param.r#type {
                self.emit_type_usage_edges(&id, ty, TypeUsageContext::Parameter);
            }
        }
        if let Some(return_type) = return_type {
            self.emit_type_usage_edges(&id, &return_type, TypeUsageContext::Return);
        }

        self.enclosing_callable.push(id);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            self.walk(&mut cursor);
        }
        self.enclosing_callable.pop();
    }

    /// Emits a Function node for an anonymous arrow/function expression
    /// bound to a top-level `const`/`let` variable, e.g.
    /// `export const formatDate = (d: Date): string => {...}` — the
    /// variable's own name becomes the function's name, per §4.4's second
    /// node-extraction bullet. No separate Variable node is emitted for
    /// these bindings; the function node stands in for it.
    fn handle_arrow_function(&mut self, statement: TsNode<'a>, name: &str, fn_node: TsNode<'a>) {
        let symbol = self.current_symbol_path(name);
        let (start_line, end_line) = self.location(statement);
        let id = make_id(&self.file_path, Some(NodeKind::Function), Some(&symbol));

        let parameters = self.extract_parameters(fn_node);
        let return_type = self
            .child_text_by_field(fn_node, "return_type")
            .map(|t| normalize_type_text(t.trim_start_matches(':')));
        let is_async = self.node_text(fn_node).trim_start().starts_with("async");

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::Function,
            name: name.to_string(),
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: self.is_exported(statement),
            content_hash: None,
            properties: NodeProperties {
                parameters: Some(parameters.clone()),
                return_type: return_type.clone(),
                is_async: Some(is_async),
                ..Default::default()
            },
        });
        self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));
        for param in &parameters {
            if let Some(ty) = &param.r#type {
                self.emit_type_usage_edges(&id, ty, TypeUsageContext::Parameter);
            }
        }
        if let Some(return_type) = return_type {
            self.emit_type_usage_edges(&id, &return_type, TypeUsageContext::Return);
        }

        self.enclosing_callable.push(id);
        if let Some(body) = fn_node.child_by_field_name("body") {
            let mut cursor = body.walk();
            self.walk(&mut cursor);
        }
        self.enclosing_callable.pop();
    }

    fn extract_parameters(&self, node: TsNode<'a>) -> Vec<Parameter> {
        let Some(params_node) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = params_node.walk();
        for child in params_node.children(&mut cursor) {
            if matches!(child.kind(), "required_parameter" | "optional_parameter" | "identifier") {
                let name = child
                    .child_by_field_name("pattern")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_else(|| self.node_text(child).to_string());
                let ty = self
                    .child_text_by_field(child, "type")
                    .map(|t| normalize_type_text(t.trim_start_matches(':')));
                out.push(Parameter { name, r#type: ty });
            }
        }
        out
    }

    fn handle_class(&mut self, node: TsNode<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let id = make_id(&self.file_path, Some(NodeKind::Class), Some(&symbol));

        let mut extends = None;
        let mut implements = Vec::new();
        if let Some(heritage) = node.child_by_field_name("heritage") {
            let mut hc = heritage.walk();
            for child in heritage.children(&mut hc) {
                match child.kind() {
                    "class_heritage" | "extends_clause" => {
                        extends = child.child_by_field_name("value").map(|n| self.node_text(n).to_string());
                    }
                    "implements_clause" => {
                        let mut ic = child.walk();
                        for iface in child.children(&mut ic) {
                            if iface.kind() == "type_identifier" {
                                implements.push(self.node_text(iface).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::Class,
            name,
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: self.is_exported(node),
            content_hash: None,
            properties: NodeProperties {
                extends: extends.clone(),
                implements: if implements.is_empty() { None } else { Some(implements.clone()) },
                ..Default::default()
            },
        });

        self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));

        if let Some(extends) = &extends {
            let target = make_id(&self.file_path, Some(NodeKind::Class), Some(extends));
            self.edges.push(Edge::new(id.clone(), target, EdgeKind::Extends));
        }
        for iface in &implements {
            let target = make_id(&self.file_path, Some(NodeKind::Interface), Some(iface));
            self.edges.push(Edge::new(id.clone(), target, EdgeKind::Implements));
        }

        self.symbol_stack.push(symbol);
        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            if body_cursor.goto_first_child() {
                loop {
                    self.walk(&mut body_cursor);
                    if !body_cursor.goto_next_sibling() {
                        break;
                    }
                }
            }
        }
        self.symbol_stack.pop();
    }

    /// True when `node` (an `object_method` inside an object literal) is
    /// reachable from its enclosing variable's export surface — i.e. the
    /// object literal is the initializer of a top-level `export const`
    /// (§4.4 "object-literal methods whose enclosing variable is exported").
    fn in_exported_object_literal(&self, node: TsNode<'a>) -> bool {
        let mut current = node;
        while let Some(parent) = current.parent() {
            if parent.kind() == "variable_declarator" {
                let declaration = parent.parent().unwrap_or(parent);
                return self.is_exported(declaration);
            }
            current = parent;
        }
        false
    }

    fn handle_interface(&mut self, node: TsNode<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let id = make_id(&self.file_path, Some(NodeKind::Interface), Some(&symbol));

        let mut extends_list = Vec::new();
        if let Some(heritage) = node.child_by_field_name("heritage") {
            let mut hc = heritage.walk();
            for child in heritage.children(&mut hc) {
                if child.kind() == "type_identifier" {
                    extends_list.push(self.node_text(child).to_string());
                }
            }
        }

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::Interface,
            name,
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: self.is_exported(node),
            content_hash: None,
            properties: NodeProperties {
                extends_list: if extends_list.is_empty() { None } else { Some(extends_list.clone()) },
                ..Default::default()
            },
        });

        self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));
        for parent in &extends_list {
            let target = make_id(&self.file_path, Some(NodeKind::Interface), Some(parent));
            self.edges.push(Edge::new(id.clone(), target, EdgeKind::Extends));
        }

        self.symbol_stack.push(symbol);
        if let Some(body) = node.child_by_field_name("body") {
            let mut bc = body.walk();
            for child in body.children(&mut bc) {
                if child.kind() == "property_signature" {
                    self.handle_property_signature(&id, child);
                }
            }
        }
        self.symbol_stack.pop();
    }

    /// Handles one interface `property_signature`. Per §4.4's node
    /// enumeration, a Property node is only emitted when the property's
    /// declared type is a non-primitive named type; a `name: string` field
    /// is recorded nowhere but the interface's own properties bag. The
    /// owner gets a `CONTAINS` edge to the Property node and a
    /// `HAS_PROPERTY` edge straight to each named type the property's
    /// declaration references (skipping the Property node as an
    /// intermediary), per the HAS_PROPERTY edge rule.
    fn handle_property_signature(&mut self, owner_id: &str, node: TsNode<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let property_type = self
            .child_text_by_field(node, "type")
            .map(|t| normalize_type_text(t.trim_start_matches(':')));
        let named_types = property_type.as_deref().map(extract_type_identifiers).unwrap_or_default();
        if named_types.is_empty() {
            return;
        }

        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let id = make_id(&self.file_path, Some(NodeKind::Property), Some(&symbol));
        let optional = self.node_text(node).contains('?');
        let readonly = self.node_text(node).trim_start().starts_with("readonly");

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::Property,
            name,
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: false,
            content_hash: None,
            properties: NodeProperties {
                property_type: property_type.clone(),
                optional: Some(optional),
                readonly: Some(readonly),
                ..Default::default()
            },
        });

        self.edges
            .push(Edge::new(owner_id.to_string(), id.clone(), EdgeKind::Contains));
        for named in named_types {
            let target = format!("unresolved-type:{named}");
            self.edges
                .push(Edge::new(owner_id.to_string(), target, EdgeKind::HasProperty));
        }
    }

    /// Handles one class field declaration (`public_field_definition` /
    /// `field_definition` depending on grammar version). Method-valued
    /// fields never reach here (methods are `method_definition` nodes,
    /// handled by [`Self::handle_function`]); a field initialized with an
    /// arrow function is caught earlier by
    /// [`Self::handle_variable_statement`]'s sibling logic only for
    /// top-level `const`s, so a class field assigned an inline arrow
    /// function still lands here — its declared type (if any) is what
    /// gets indexed, per the same non-primitive-only gating as interface
    /// properties.
    fn handle_class_property(&mut self, node: TsNode<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let property_type = self
            .child_text_by_field(node, "type")
            .map(|t| normalize_type_text(t.trim_start_matches(':')));
        let named_types = property_type.as_deref().map(extract_type_identifiers).unwrap_or_default();
        if named_types.is_empty() {
            return;
        }

        let owner_id = self.container_id();
        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let id = make_id(&self.file_path, Some(NodeKind::Property), Some(&symbol));
        let text = self.node_text(node);
        let optional = text.contains('?');
        let readonly = text.trim_start().starts_with("readonly")
            || text.split_whitespace().any(|w| w == "readonly");

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::Property,
            name,
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: false,
            content_hash: None,
            properties: NodeProperties {
                property_type: property_type.clone(),
                optional: Some(optional),
                readonly: Some(readonly),
                ..Default::default()
            },
        });

        self.edges.push(Edge::new(owner_id.clone(), id, EdgeKind::Contains));
        for named in named_types {
            let target = format!("unresolved-type:{named}");
            self.edges.push(Edge::new(owner_id.clone(), target, EdgeKind::HasProperty));
        }
    }

    fn handle_type_alias(&mut self, node: TsNode<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = self.node_text(name_node).to_string();
        let symbol = self.current_symbol_path(&name);
        let (start_line, end_line) = self.location(node);
        let id = make_id(&self.file_path, Some(NodeKind::TypeAlias), Some(&symbol));
        let aliased = self
            .child_text_by_field(node, "value")
            .map(normalize_type_text)
            .unwrap_or_default();

        self.nodes.push(Node {
            id: id.clone(),
            kind: NodeKind::TypeAlias,
            name: name.clone(),
            package: package_of(&self.file_path),
            file_path: self.file_path.clone(),
            start_line,
            end_line,
            exported: self.is_exported(node),
            content_hash: None,
            properties: NodeProperties {
                aliased_type: Some(aliased.clone()),
                ..Default::default()
            },
        });
        self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));

        // `type Service = ReturnType<typeof createService>;` — the alias
        // points at a type expression with no declaration of its own, so a
        // SyntheticType node stands in for it and an ALIAS_FOR edge records
        // which user-facing name the formatter should display instead
        // (§4.1 `build_alias_map`, invariant 5).
        if aliased.starts_with("ReturnType<") {
            let synthetic_id = make_id(&self.file_path, Some(NodeKind::SyntheticType), Some(&aliased));
            self.nodes.push(Node {
                id: synthetic_id.clone(),
                kind: NodeKind::SyntheticType,
                name: aliased.clone(),
                package: package_of(&self.file_path),
                file_path: self.file_path.clone(),
                start_line,
                end_line,
                exported: false,
                content_hash: None,
                properties: NodeProperties::default(),
            });
            self.edges.push(Edge::new(id, synthetic_id, EdgeKind::AliasFor));
        }

        self.alias_map.insert(aliased, name);
    }

    fn handle_variable_statement(&mut self, node: TsNode<'a>) {
        let is_const = self.node_text(node).trim_start().starts_with("const");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = child.child_by_field_name("name") else { continue };
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = self.node_text(name_node).to_string();

            if let Some(value) = child.child_by_field_name("value") {
                if matches!(value.kind(), "arrow_function" | "function_expression") {
                    self.handle_arrow_function(node, &name, value);
                    continue;
                }
                if value.kind() == "identifier" {
                    self.local_aliases
                        .insert(name.clone(), self.node_text(value).to_string());
                }
            }

            let symbol = self.current_symbol_path(&name);
            let (start_line, end_line) = self.location(child);
            let id = make_id(&self.file_path, Some(NodeKind::Variable), Some(&symbol));
            let variable_type = self
                .child_text_by_field(name_node, "type")
                .or_else(|| self.child_text_by_field(child, "type"))
                .map(|t| normalize_type_text(t.trim_start_matches(':')));

            self.nodes.push(Node {
                id: id.clone(),
                kind: NodeKind::Variable,
                name,
                package: package_of(&self.file_path),
                file_path: self.file_path.clone(),
                start_line,
                end_line,
                exported: self.is_exported(node),
                content_hash: None,
                properties: NodeProperties {
                    variable_type: variable_type.clone(),
                    is_const: Some(is_const),
                    ..Default::default()
                },
            });
            self.edges.push(Edge::new(self.container_id(), id.clone(), EdgeKind::Contains));
            if let Some(ty) = &variable_type {
                for named in extract_type_identifiers(ty) {
                    let target = format!("unresolved-type:{named}");
                    self.edges.push(Edge::new(id.clone(), target, EdgeKind::HasType));
                }
            }

            // Record/dispatch-table literal: `{ admin: formatAdmin, ... }`.
            // Each property whose value is a bare identifier is a REFERENCES
            // edge from the table to the referenced declaration (§4.4
            // REFERENCES rule, scenario S3), not a HAS_PROPERTY edge — the
            // values are callables passed by reference, not typed fields.
            if let Some(value) = child.child_by_field_name("value") {
                if value.kind() == "object" {
                    let mut oc = value.walk();
                    for pair in value.children(&mut oc) {
                        if pair.kind() != "pair" {
                            continue;
                        }
                        let Some(prop_value) = pair.child_by_field_name("value") else { continue };
                        if prop_value.kind() != "identifier" {
                            continue;
                        }
                        let referenced = self.resolve_alias(self.node_text(prop_value)).to_string();
                        let target = format!("unresolved:{referenced}");
                        let mut edge = Edge::new(id.clone(), target, EdgeKind::References);
                        edge.reference_context = Some(ReferenceContext::Property);
                        self.edges.push(edge);
                    }
                }
            }
        }
    }

    fn handle_call(&mut self, node: TsNode<'a>) {
        let Some(caller) = self.enclosing_callable.last().cloned() else { return };
        let Some(function_node) = node.child_by_field_name("function") else { return };

        // Dynamic dispatch through a table (`dispatchTable[key]()`): the
        // actual callee isn't statically known, but the access to the
        // table itself is a REFERENCES edge (§4.4 REFERENCES rule, S3).
        if function_node.kind() == "subscript_expression" {
            if let Some(object) = function_node.child_by_field_name("object") {
                if object.kind() == "identifier" {
                    let table = self.resolve_alias(self.node_text(object)).to_string();
                    let target = format!("unresolved:{table}");
                    let mut edge = Edge::new(caller, target, EdgeKind::References);
                    edge.reference_context = Some(ReferenceContext::Access);
                    self.edges.push(edge);
                }
            }
            return;
        }

        let callee_name = match function_node.kind() {
            "identifier" => self.node_text(function_node).to_string(),
            "member_expression" => self
                .child_text_by_field(function_node, "property")
                .unwrap_or("")
                .to_string(),
            _ => return,
        };
        if callee_name.is_empty() {
            return;
        }
        // Resolve through any local `const alias = target;` binding so the
        // edge targets the underlying declaration, never the alias
        // variable itself (§4.4 CALLS rule, scenario S2).
        let callee_name = self.resolve_alias(&callee_name).to_string();
        // Resolved to a bare name here; the ingestion driver's cross-file
        // pass rewrites this into a concrete node id once the whole
        // project's symbol table is known.
        let target_placeholder = format!("unresolved:{callee_name}");
        let (start_line, end_line) = self.location(node);
        let mut edge = Edge::new(caller, target_placeholder, EdgeKind::Calls);
        edge.call_count = Some(1);
        edge.call_sites = Some(vec![LineRange { start_line, end_line }]);
        self.edges.push(edge);
    }

    fn emit_type_usage_edges(&mut self, owner_id: &str, type_text: &str, context: TypeUsageContext) {
        for identifier in extract_type_identifiers(type_text) {
            let target = format!("unresolved-type:{identifier}");
            let mut edge = Edge::new(owner_id.to_string(), target, EdgeKind::UsesType);
            edge.context = Some(context);
            self.edges.push(edge);
        }
        // A factory function whose declared return type is an anonymous
        // object literal (`(): { foo(): void } => ...`) has no named
        // declaration to point at, so RETURNS targets a SyntheticType node
        // created on the spot (§4.4 RETURNS rule).
        if matches!(context, TypeUsageContext::Return) && type_text.starts_with('{') {
            let synthetic_id = make_id(&self.file_path, Some(NodeKind::SyntheticType), Some(type_text));
            self.nodes.push(Node {
                id: synthetic_id.clone(),
                kind: NodeKind::SyntheticType,
                name: type_text.to_string(),
                package: package_of(&self.file_path),
                file_path: self.file_path.clone(),
                start_line: 1,
                end_line: 1,
                exported: false,
                content_hash: None,
                properties: NodeProperties::default(),
            });
            self.edges
                .push(Edge::new(owner_id.to_string(), synthetic_id, EdgeKind::Returns));
        }
    }

    fn container_id(&self) -> String {
        if self.symbol_stack.is_empty() {
            make_id(&self.file_path, None, None)
        } else {
            make_id(&self.file_path, Some(NodeKind::Class), Some(&self.symbol_stack.join(".")))
        }
    }
}

/// Collapses repeated `CALLS` edges between the same (source, target) pair
/// into one, aggregating `call_count` and sorting `call_sites` by
/// `start_line` ascending, per §4.4's CALLS rule and testable property 6.
/// Non-`CALLS` edges pass through untouched.
fn merge_call_edges(edges: Vec<Edge>) -> Vec<Edge> {
    let mut merged: Vec<Edge> = Vec::with_capacity(edges.len());
    let mut index: std::collections::HashMap<(String, String), usize> = std::collections::HashMap::new();

    for edge in edges {
        if edge.kind != EdgeKind::Calls {
            merged.push(edge);
            continue;
        }
        let key = (edge.source_id.clone(), edge.target_id.clone());
        if let Some(&pos) = index.get(&key) {
            let existing = &mut merged[pos];
            existing.call_count = Some(existing.call_count.unwrap_or(0) + edge.call_count.unwrap_or(1));
            let mut sites = existing.call_sites.clone().unwrap_or_default();
            sites.extend(edge.call_sites.unwrap_or_default());
            sites.sort_by_key(|s| s.start_line);
            existing.call_sites = Some(sites);
        } else {
            index.insert(key, merged.len());
            merged.push(edge);
        }
    }
    merged
}

fn visibility_of(text: &str) -> Visibility {
    if text.contains("private ") {
        Visibility::Private
    } else if text.contains("protected ") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn package_of(file_path: &str) -> String {
    file_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

fn find_child_of_kind<'a>(node: TsNode<'a>, kind: &str) -> Option<TsNode<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn resolve_relative_import(current_file: &str, specifier: &str) -> String {
    let base_dir = current_file.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if joined.ends_with(".ts") || joined.ends_with(".tsx") {
        joined
    } else {
        format!("{joined}.ts")
    }
}

/// Walks one `import_clause`, recording each local binding it introduces in
/// `import_map` (local name -> `(resolved_file, exported_name)`, `"*"` as
/// the exported name for a namespace import) so the pipeline's cross-file
/// resolution pass (§4.4 "Cross-file resolution") can look a symbol's
/// origin up by its local name. `out` collects the raw imported-symbol
/// names for the `IMPORTS` edge's own metadata, independent of aliasing.
fn collect_import_bindings<'a>(
    source: &'a str,
    clause: TsNode<'a>,
    resolved_file: &str,
    import_map: &mut ImportMap,
    out: &mut Vec<String>,
) {
    let text = |n: TsNode<'a>| n.utf8_text(source.as_bytes()).unwrap_or("");
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                let local = text(child).to_string();
                import_map.insert(local.clone(), (resolved_file.to_string(), "default".to_string()));
                out.push(local);
            }
            "named_imports" => {
                let mut nc = child.walk();
                for spec in child.children(&mut nc) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name_node) = spec.child_by_field_name("name") else { continue };
                    let exported = text(name_node).to_string();
                    let local = spec
                        .child_by_field_name("alias")
                        .map(|a| text(a).to_string())
                        .unwrap_or_else(|| exported.clone());
                    import_map.insert(local, (resolved_file.to_string(), exported.clone()));
                    out.push(exported);
                }
            }
            "namespace_import" => {
                let mut nic = child.walk();
                if let Some(local_node) = child
                    .children(&mut nic)
                    .find(|n| n.kind() == "identifier")
                {
                    let local = text(local_node).to_string();
                    import_map.insert(local, (resolved_file.to_string(), "*".to_string()));
                }
                out.push("*".to_string());
            }
            _ => {}
        }
    }
}

/// Pulls bare type identifiers out of a (possibly generic/union) type
/// string, e.g. `Promise<Foo | Bar[]>` yields `["Promise", "Foo", "Bar"]`.
fn extract_type_identifiers(type_text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in type_text.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '$' {
            current.push(ch);
        } else {
            if !current.is_empty() && current.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                out.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if !current.is_empty() && current.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
        out.push(current);
    }
    out.retain(|s| !matches!(s.as_str(), "Promise" | "Array" | "Record" | "Partial" | "Readonly"));
    out
}
