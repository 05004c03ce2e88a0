use codegraph_core::{Edge, EdgeKind, Node, NodeKind, NodeProperties};
use codegraph_graph::{traversal, Store};

fn node(id: &str, name: &str, file_path: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeKind::Function,
        name: name.to_string(),
        package: "pkg".to_string(),
        file_path: file_path.to_string(),
        start_line: 1,
        end_line: 5,
        exported: true,
        content_hash: None,
        properties: NodeProperties::default(),
    }
}

fn chain_store() -> Store {
    // a -> b -> c -> d, all CALLS edges.
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("f:Function:a", "a", "f"),
            node("f:Function:b", "b", "f"),
            node("f:Function:c", "c", "f"),
            node("f:Function:d", "d", "f"),
        ])
        .unwrap();
    store
        .add_edges(&[
            Edge::new("f:Function:a", "f:Function:b", EdgeKind::Calls),
            Edge::new("f:Function:b", "f:Function:c", EdgeKind::Calls),
            Edge::new("f:Function:c", "f:Function:d", EdgeKind::Calls),
        ])
        .unwrap();
    store
}

#[test]
fn dependency_edges_respects_depth_bound() {
    let store = chain_store();
    let a = "f:Function:a".to_string();

    let one_hop = traversal::dependency_edges(&store, &a, 1).unwrap();
    assert_eq!(one_hop.len(), 1);
    assert_eq!(one_hop[0].edge.target_id, "f:Function:b");

    let two_hop = traversal::dependency_edges(&store, &a, 2).unwrap();
    assert_eq!(two_hop.len(), 2);
}

#[test]
fn dependent_edges_walks_incoming_direction() {
    let store = chain_store();
    let d = "f:Function:d".to_string();

    let deps = traversal::dependent_edges(&store, &d, 2).unwrap();
    let targets: Vec<_> = deps.iter().map(|e| e.edge.source_id.clone()).collect();
    assert!(targets.contains(&"f:Function:c".to_string()));
    assert!(targets.contains(&"f:Function:b".to_string()));
}

#[test]
fn shortest_path_finds_the_direct_chain() {
    let store = chain_store();
    let a = "f:Function:a".to_string();
    let d = "f:Function:d".to_string();

    let path = traversal::shortest_path(&store, &a, &d, 5).unwrap().expect("path should exist");
    assert_eq!(path.len(), 3);
}

#[test]
fn shortest_path_returns_empty_path_for_identical_endpoints() {
    let store = chain_store();
    let a = "f:Function:a".to_string();

    let path = traversal::shortest_path(&store, &a, &a, 5).unwrap().expect("trivial path");
    assert!(path.is_empty());
}

#[test]
fn shortest_path_falls_back_to_the_reverse_direction() {
    // a -> b -> c -> d; querying d -> a has no forward path, so the reverse
    // search (a -> d) must be attempted and its edges returned unchanged
    // (§4.6 bidirectional policy, testable property 7).
    let store = chain_store();
    let a = "f:Function:a".to_string();
    let d = "f:Function:d".to_string();

    let forward = traversal::shortest_path(&store, &a, &d, 5).unwrap().expect("forward path");
    let reverse = traversal::shortest_path(&store, &d, &a, 5).unwrap().expect("reverse fallback path");

    assert_eq!(reverse.len(), forward.len());
    let forward_ids: Vec<(&str, &str)> = forward
        .edges
        .iter()
        .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
        .collect();
    let reverse_ids: Vec<(&str, &str)> = reverse
        .edges
        .iter()
        .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
        .collect();
    assert_eq!(forward_ids, reverse_ids);
}

#[test]
fn shortest_path_returns_none_when_unreachable() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[node("f:Function:a", "a", "f"), node("f:Function:z", "z", "f")])
        .unwrap();

    let path = traversal::shortest_path(&store, &"f:Function:a".to_string(), &"f:Function:z".to_string(), 5).unwrap();
    assert!(path.is_none());
}

#[test]
fn k_paths_returns_at_most_k_distinct_paths() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[
            node("f:Function:a", "a", "f"),
            node("f:Function:b", "b", "f"),
            node("f:Function:c", "c", "f"),
            node("f:Function:d", "d", "f"),
        ])
        .unwrap();
    store
        .add_edges(&[
            Edge::new("f:Function:a", "f:Function:b", EdgeKind::Calls),
            Edge::new("f:Function:a", "f:Function:c", EdgeKind::Calls),
            Edge::new("f:Function:b", "f:Function:d", EdgeKind::Calls),
            Edge::new("f:Function:c", "f:Function:d", EdgeKind::Calls),
        ])
        .unwrap();

    let paths = traversal::k_paths(&store, &"f:Function:a".to_string(), &"f:Function:d".to_string(), 2, 5).unwrap();
    assert_eq!(paths.len(), 2);
}

#[test]
fn impact_follows_only_impact_relevant_kinds() {
    let store = Store::open_in_memory().unwrap();
    store
        .add_nodes(&[node("f:Function:a", "a", "f"), node("f:Function:b", "b", "f")])
        .unwrap();
    store
        .add_edges(&[Edge::new("f:Function:a", "f:Function:b", EdgeKind::Imports)])
        .unwrap();

    let affected = traversal::impact(&store, &"f:Function:b".to_string(), 2).unwrap();
    assert!(affected.is_empty());
}

#[test]
fn connect_seeds_finds_paths_between_every_pair() {
    let store = chain_store();
    let seeds = vec!["f:Function:a".to_string(), "f:Function:d".to_string()];

    let paths = traversal::connect_seeds(&store, &seeds, 5).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 3);
}

#[test]
fn connect_seeds_returns_empty_when_any_pair_is_disconnected() {
    // a -> b -> c -> d plus an isolated node z: {a, d, z} has two connected
    // pairs and one disconnected pair, so the whole result must be empty
    // (§4.6: "otherwise the empty set").
    let store = chain_store();
    store.add_nodes(&[node("f:Function:z", "z", "f")]).unwrap();
    let seeds = vec![
        "f:Function:a".to_string(),
        "f:Function:d".to_string(),
        "f:Function:z".to_string(),
    ];

    let paths = traversal::connect_seeds(&store, &seeds, 5).unwrap();
    assert!(paths.is_empty());
}
