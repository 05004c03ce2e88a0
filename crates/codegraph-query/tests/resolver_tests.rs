use codegraph_core::{Edge, EdgeKind, Node, NodeKind, NodeProperties, SearchProvider};
use codegraph_graph::Store;
use codegraph_query::{resolve, resolve_with_search, Disposition, SymbolQuery};

fn node(id: &str, kind: NodeKind, name: &str, file: &str, line: u32) -> Node {
    Node {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        package: "root".to_string(),
        file_path: file.to_string(),
        start_line: line,
        end_line: line + 2,
        exported: true,
        content_hash: None,
        properties: NodeProperties::default(),
    }
}

#[test]
fn unique_name_hit_resolves_directly() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[node("src/a.ts:Function:formatDate", NodeKind::Function, "formatDate", "src/a.ts", 1)])
        .unwrap();

    let result = resolve(&store, &SymbolQuery { symbol: "formatDate".to_string(), file: None, package: None }).unwrap();
    assert!(matches!(result.disposition, Disposition::Unique(_)));
    assert!(result.file_path_was_resolved);
}

#[test]
fn two_files_with_same_name_are_ambiguous() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("src/a.ts:Function:run", NodeKind::Function, "run", "src/a.ts", 1),
            node("src/b.ts:Function:run", NodeKind::Function, "run", "src/b.ts", 1),
        ])
        .unwrap();

    let result = resolve(&store, &SymbolQuery { symbol: "run".to_string(), file: None, package: None }).unwrap();
    match result.disposition {
        Disposition::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn not_found_returns_fuzzy_suggestions() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[node("src/a.ts:Function:formatDate", NodeKind::Function, "formatDate", "src/a.ts", 1)])
        .unwrap();

    let result = resolve(&store, &SymbolQuery { symbol: "formatDates".to_string(), file: None, package: None }).unwrap();
    match result.disposition {
        Disposition::NotFound { suggestions } => assert!(suggestions.contains(&"formatDate".to_string())),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

struct StubSearchProvider(Vec<&'static str>);

impl SearchProvider for StubSearchProvider {
    fn suggest(&self, _query: &str, limit: usize) -> Vec<String> {
        self.0.iter().take(limit).map(|s| s.to_string()).collect()
    }
}

#[test]
fn not_found_prefers_search_provider_suggestions() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[node("src/a.ts:Function:formatDate", NodeKind::Function, "formatDate", "src/a.ts", 1)])
        .unwrap();
    let search = StubSearchProvider(vec!["formatDateTime"]);

    let result = resolve_with_search(
        &store,
        &SymbolQuery { symbol: "formatDates".to_string(), file: None, package: None },
        &search,
    )
    .unwrap();
    match result.disposition {
        Disposition::NotFound { suggestions } => {
            assert_eq!(suggestions[0], "formatDateTime");
            assert!(suggestions.contains(&"formatDate".to_string()));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn class_with_single_dependency_bearing_method_resolves_transparently() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("src/cmd.ts:Class:SetDefaultProviderCommand", NodeKind::Class, "SetDefaultProviderCommand", "src/cmd.ts", 1),
            node("src/cmd.ts:Method:SetDefaultProviderCommand.execute", NodeKind::Method, "execute", "src/cmd.ts", 2),
            node("src/svc.ts:Method:ProviderService.setAsDefault", NodeKind::Method, "setAsDefault", "src/svc.ts", 1),
        ])
        .unwrap();
    store
        .add_edges(&[Edge::new(
            "src/cmd.ts:Method:SetDefaultProviderCommand.execute",
            "src/svc.ts:Method:ProviderService.setAsDefault",
            EdgeKind::Calls,
        )])
        .unwrap();

    let result = resolve(
        &store,
        &SymbolQuery { symbol: "SetDefaultProviderCommand".to_string(), file: None, package: None },
    )
    .unwrap();

    match result.disposition {
        Disposition::Unique(resolved) => {
            assert_eq!(resolved.name, "execute");
            assert_eq!(result.resolved_from_class.as_deref(), Some("SetDefaultProviderCommand"));
        }
        other => panic!("expected transparent Unique resolution, got {other:?}"),
    }
}

#[test]
fn class_with_two_dependency_bearing_methods_is_ambiguous() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("src/c.ts:Class:Widget", NodeKind::Class, "Widget", "src/c.ts", 1),
            node("src/c.ts:Method:Widget.a", NodeKind::Method, "a", "src/c.ts", 2),
            node("src/c.ts:Method:Widget.b", NodeKind::Method, "b", "src/c.ts", 5),
            node("src/t.ts:Function:target", NodeKind::Function, "target", "src/t.ts", 1),
        ])
        .unwrap();
    store
        .add_edges(&[
            Edge::new("src/c.ts:Method:Widget.a", "src/t.ts:Function:target", EdgeKind::Calls),
            Edge::new("src/c.ts:Method:Widget.b", "src/t.ts:Function:target", EdgeKind::Calls),
        ])
        .unwrap();

    let result =
        resolve(&store, &SymbolQuery { symbol: "Widget".to_string(), file: None, package: None }).unwrap();
    match result.disposition {
        Disposition::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn class_with_its_own_dependency_edge_skips_fallback() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("src/c.ts:Class:Thing", NodeKind::Class, "Thing", "src/c.ts", 1),
            node("src/c.ts:Method:Thing.run", NodeKind::Method, "run", "src/c.ts", 2),
            node("src/t.ts:Function:base", NodeKind::Function, "base", "src/t.ts", 1),
        ])
        .unwrap();
    store
        .add_edges(&[Edge::new("src/c.ts:Class:Thing", "src/t.ts:Function:base", EdgeKind::Extends)])
        .unwrap();

    let result = resolve(&store, &SymbolQuery { symbol: "Thing".to_string(), file: None, package: None }).unwrap();
    match result.disposition {
        Disposition::Unique(resolved) => assert_eq!(resolved.kind, NodeKind::Class),
        other => panic!("expected the class itself to resolve, got {other:?}"),
    }
}

#[test]
fn literal_lookup_with_file_short_circuits_name_lookup() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("src/a.ts:Function:run", NodeKind::Function, "run", "src/a.ts", 1),
            node("src/b.ts:Function:run", NodeKind::Function, "run", "src/b.ts", 1),
        ])
        .unwrap();

    let result = resolve(
        &store,
        &SymbolQuery { symbol: "run".to_string(), file: Some("src/a.ts".to_string()), package: None },
    )
    .unwrap();
    match result.disposition {
        Disposition::Unique(n) => assert_eq!(n.file_path, "src/a.ts"),
        other => panic!("expected literal-lookup hit, got {other:?}"),
    }
}
