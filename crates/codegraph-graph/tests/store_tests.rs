use codegraph_core::{Edge, EdgeKind, Node, NodeKind, NodeProperties};
use codegraph_graph::Store;

fn make_node(id: &str, kind: NodeKind, name: &str, file_path: &str) -> Node {
    Node {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        package: "pkg".to_string(),
        file_path: file_path.to_string(),
        start_line: 1,
        end_line: 10,
        exported: true,
        content_hash: Some("hash1".to_string()),
        properties: NodeProperties::default(),
    }
}

fn make_edge(source: &str, target: &str, kind: EdgeKind) -> Edge {
    Edge::new(source, target, kind)
}

#[test]
fn add_and_get_node_round_trips() {
    let store = Store::open_in_memory().unwrap();
    let node = make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts");
    store.add_nodes(&[node.clone()]).unwrap();

    let fetched = store.get_node(&node.id).unwrap().expect("node should exist");
    assert_eq!(fetched.name, "foo");
    assert_eq!(fetched.kind, NodeKind::Function);
    assert_eq!(fetched.file_path, "src/a.ts");
}

#[test]
fn find_nodes_by_name_matches_across_files() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts"),
            make_node("src/b.ts:Function:foo", NodeKind::Function, "foo", "src/b.ts"),
        ])
        .unwrap();

    let found = store.find_nodes_by_name("foo").unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn add_nodes_upserts_on_conflict() {
    let store = Store::open_in_memory().unwrap();
    let mut node = make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts");
    store.add_nodes(&[node.clone()]).unwrap();

    node.end_line = 99;
    store.add_nodes(&[node]).unwrap();

    let fetched = store.get_node("src/a.ts:Function:foo").unwrap().unwrap();
    assert_eq!(fetched.end_line, 99);
    assert_eq!(store.node_count().unwrap(), 1);
}

#[test]
fn remove_file_nodes_deletes_nodes_and_outgoing_edges() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts"),
            make_node("src/b.ts:Function:bar", NodeKind::Function, "bar", "src/b.ts"),
        ])
        .unwrap();
    store
        .add_edges(&[make_edge(
            "src/a.ts:Function:foo",
            "src/b.ts:Function:bar",
            EdgeKind::Calls,
        )])
        .unwrap();

    store.remove_file_nodes("src/a.ts").unwrap();

    assert!(store.get_node("src/a.ts:Function:foo").unwrap().is_none());
    assert!(store.get_node("src/b.ts:Function:bar").unwrap().is_some());

    // The edge's source lived in the removed file, so it goes too.
    let adjacency = store.fetch_full_adjacency().unwrap();
    assert!(adjacency.outgoing.is_empty());
}

#[test]
fn remove_file_nodes_preserves_incoming_edges_from_other_files() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts"),
            make_node("src/b.ts:Function:bar", NodeKind::Function, "bar", "src/b.ts"),
        ])
        .unwrap();
    store
        .add_edges(&[make_edge(
            "src/a.ts:Function:foo",
            "src/b.ts:Function:bar",
            EdgeKind::Calls,
        )])
        .unwrap();

    // Remove only the target node's file; the edge's source lives
    // elsewhere and per §4.3 must survive, dangling on the target end,
    // until b.ts is reinserted later in the same reindexing batch.
    store.remove_file_nodes("src/b.ts").unwrap();

    assert!(store.get_node("src/a.ts:Function:foo").unwrap().is_some());
    assert!(store.get_node("src/b.ts:Function:bar").unwrap().is_none());

    let adjacency = store.fetch_full_adjacency().unwrap();
    // The dangling edge must not surface through the inner-join query.
    assert!(adjacency.outgoing.get("src/a.ts:Function:foo").is_none());
}

#[test]
fn delete_file_also_removes_edges_pointing_at_the_deleted_file() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts"),
            make_node("src/b.ts:Function:bar", NodeKind::Function, "bar", "src/b.ts"),
        ])
        .unwrap();
    store
        .add_edges(&[make_edge(
            "src/a.ts:Function:foo",
            "src/b.ts:Function:bar",
            EdgeKind::Calls,
        )])
        .unwrap();

    store.delete_file("src/b.ts").unwrap();

    assert!(store.get_node("src/a.ts:Function:foo").unwrap().is_some());
    let adjacency = store.fetch_full_adjacency().unwrap();
    assert!(adjacency.outgoing.get("src/a.ts:Function:foo").is_none());
}

#[test]
fn clear_all_empties_both_tables() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts")])
        .unwrap();

    store.clear_all().unwrap();

    assert_eq!(store.node_count().unwrap(), 0);
}

#[test]
fn file_content_hash_supports_skip_short_circuit() {
    let store = Store::open_in_memory().unwrap();
    let file_node = make_node("src/a.ts", NodeKind::File, "a.ts", "src/a.ts");
    store.add_nodes(&[file_node]).unwrap();

    let hash = store.file_content_hash("src/a.ts").unwrap();
    assert_eq!(hash.as_deref(), Some("hash1"));
}

#[test]
fn short_form_id_lookup_matches_long_form_row() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts")])
        .unwrap();

    let pattern = codegraph_core::ids::id_lookup_pattern("src/a.ts", "foo");
    let found = store.get_node(&pattern).unwrap();
    assert!(found.is_some());
}

#[test]
fn open_on_disk_persists_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.sqlite");

    {
        let store = Store::open(&db_path).unwrap();
        store
            .add_nodes(&[make_node("src/a.ts:Function:foo", NodeKind::Function, "foo", "src/a.ts")])
            .unwrap();
    }

    let reopened = Store::open(&db_path).unwrap();
    assert_eq!(reopened.node_count().unwrap(), 1);
}
