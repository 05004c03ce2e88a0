use crate::store::{AdjacencyMap, Store};
use codegraph_core::{Edge, NodeId, Result};
use std::collections::{HashSet, VecDeque};

/// One hop of a traversal result: the edge taken plus the distance (in
/// hops) from the nearest seed.
#[derive(Debug, Clone)]
pub struct TraversalEdge {
    pub edge: Edge,
    pub depth: usize,
}

/// A single path between two nodes, as an ordered list of edges.
#[derive(Debug, Clone)]
pub struct Path {
    pub edges: Vec<Edge>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Bounded-depth frontier BFS over a pre-loaded [`AdjacencyMap`]. Drives
/// every traversal operation uniformly — `dependency_edges` walks
/// outgoing, `dependent_edges` walks incoming, `impact`/`connect_seeds`
/// seed from multiple nodes at once.
fn bfs(
    map: &AdjacencyMap,
    seeds: &[NodeId],
    depth: usize,
    outgoing: bool,
    kinds: Option<&[codegraph_core::EdgeKind]>,
) -> Vec<TraversalEdge> {
    let mut visited: HashSet<NodeId> = seeds.iter().cloned().collect();
    let mut queue: VecDeque<(NodeId, usize)> = seeds.iter().map(|s| (s.clone(), 0)).collect();
    let mut out = Vec::new();

    while let Some((current, d)) = queue.pop_front() {
        if d >= depth {
            continue;
        }
        let edges = if outgoing {
            map.outgoing.get(&current)
        } else {
            map.incoming.get(&current)
        };
        let Some(edges) = edges else { continue };

        for edge in edges {
            if let Some(kinds) = kinds {
                if !kinds.contains(&edge.kind) {
                    continue;
                }
            }
            let next = if outgoing { &edge.target_id } else { &edge.source_id };
            out.push(TraversalEdge { edge: edge.clone(), depth: d + 1 });
            if visited.insert(next.clone()) {
                queue.push_back((next.clone(), d + 1));
            }
        }
    }
    out
}

/// Returns everything `node_id` depends on (outgoing edges), up to
/// `depth` hops.
pub fn dependency_edges(store: &Store, node_id: &NodeId, depth: usize) -> Result<Vec<TraversalEdge>> {
    let map = store.fetch_adjacency(std::slice::from_ref(node_id), depth)?;
    Ok(bfs(&map, std::slice::from_ref(node_id), depth, true, None))
}

/// Returns everything that depends on `node_id` (incoming edges), up to
/// `depth` hops.
pub fn dependent_edges(store: &Store, node_id: &NodeId, depth: usize) -> Result<Vec<TraversalEdge>> {
    let map = store.fetch_adjacency(std::slice::from_ref(node_id), depth)?;
    Ok(bfs(&map, std::slice::from_ref(node_id), depth, false, None))
}

/// Finds a shortest path between `from` and `to`. Tries a forward BFS from
/// `from` first; if no forward path exists within `max_depth`, attempts the
/// reverse search (`from <- to`) and returns that path unchanged — the
/// edges' own direction still encodes which way the dependency runs (§4.6
/// bidirectional policy, testable property 7).
pub fn shortest_path(store: &Store, from: &NodeId, to: &NodeId, max_depth: usize) -> Result<Option<Path>> {
    let local = store.fetch_adjacency(&[from.clone()], max_depth)?;
    if let Some(path) = bfs_shortest(&local, from, to, max_depth) {
        return Ok(Some(path));
    }

    let full = store.fetch_full_adjacency()?;
    Ok(bfs_shortest(&full, to, from, max_depth))
}

fn bfs_shortest(map: &AdjacencyMap, from: &NodeId, to: &NodeId, max_depth: usize) -> Option<Path> {
    if from == to {
        return Some(Path { edges: Vec::new() });
    }
    let mut visited: HashSet<NodeId> = HashSet::from([from.clone()]);
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(from.clone(), 0)]);
    let mut parent: std::collections::HashMap<NodeId, (NodeId, Edge)> = std::collections::HashMap::new();

    while let Some((current, d)) = queue.pop_front() {
        if d >= max_depth {
            continue;
        }
        let Some(edges) = map.outgoing.get(&current) else { continue };
        for edge in edges {
            if visited.insert(edge.target_id.clone()) {
                parent.insert(edge.target_id.clone(), (current.clone(), edge.clone()));
                if &edge.target_id == to {
                    return Some(reconstruct(&parent, to));
                }
                queue.push_back((edge.target_id.clone(), d + 1));
            }
        }
    }
    None
}

fn reconstruct(parent: &std::collections::HashMap<NodeId, (NodeId, Edge)>, to: &NodeId) -> Path {
    let mut edges = Vec::new();
    let mut current = to.clone();
    while let Some((prev, edge)) = parent.get(&current) {
        edges.push(edge.clone());
        current = prev.clone();
    }
    edges.reverse();
    Path { edges }
}

/// Finds up to `k` distinct simple paths between `from` and `to`, by
/// repeatedly finding a shortest path and then excluding the edge most
/// recently used to avoid returning the same path twice (a
/// Yen's-algorithm-adjacent approximation bounded in scope to what the
/// spec requires: distinct paths, not globally shortest distinct paths).
pub fn k_paths(store: &Store, from: &NodeId, to: &NodeId, k: usize, max_depth: usize) -> Result<Vec<Path>> {
    let map = store.fetch_full_adjacency()?;
    let mut found = Vec::new();
    let mut excluded_edges: HashSet<(NodeId, NodeId)> = HashSet::new();

    while found.len() < k {
        let filtered = filter_adjacency(&map, &excluded_edges);
        let Some(path) = bfs_shortest(&filtered, from, to, max_depth) else { break };
        if path.is_empty() && from != to {
            break;
        }
        for edge in &path.edges {
            excluded_edges.insert((edge.source_id.clone(), edge.target_id.clone()));
        }
        if path.edges.is_empty() && found.iter().any(|p: &Path| p.is_empty()) {
            break;
        }
        found.push(path);
    }
    Ok(found)
}

fn filter_adjacency(map: &AdjacencyMap, excluded: &HashSet<(NodeId, NodeId)>) -> AdjacencyMap {
    let mut out = AdjacencyMap::default();
    for (node, edges) in &map.outgoing {
        let kept: Vec<Edge> = edges
            .iter()
            .filter(|e| !excluded.contains(&(e.source_id.clone(), e.target_id.clone())))
            .cloned()
            .collect();
        if !kept.is_empty() {
            out.outgoing.insert(node.clone(), kept);
        }
    }
    for (node, edges) in &map.incoming {
        let kept: Vec<Edge> = edges
            .iter()
            .filter(|e| !excluded.contains(&(e.source_id.clone(), e.target_id.clone())))
            .cloned()
            .collect();
        if !kept.is_empty() {
            out.incoming.insert(node.clone(), kept);
        }
    }
    out
}

/// Set of nodes reachable from `node_id` by following the impact-relevant
/// edge kinds (calls, references, type usage, inheritance, properties,
/// returns) up to `depth` hops — used to answer "what would break if I
/// changed this".
pub fn impact(store: &Store, node_id: &NodeId, depth: usize) -> Result<Vec<TraversalEdge>> {
    let map = store.fetch_adjacency(std::slice::from_ref(node_id), depth)?;
    Ok(bfs(
        &map,
        std::slice::from_ref(node_id),
        depth,
        false,
        Some(codegraph_core::IMPACT_KINDS),
    ))
}

/// Connects a set of seed nodes with a small Steiner-like subgraph: runs a
/// multi-source BFS from each seed until two seeds' frontiers meet, then
/// unions the discovered connecting paths. Not a minimum Steiner tree —
/// the spec calls for "a" connecting subgraph, not the optimal one.
///
/// Per §4.6, the result is all-or-nothing: if any pair of seeds has no
/// connecting path within `max_depth`, the whole set is disconnected and
/// the empty set is returned rather than a partial subgraph.
pub fn connect_seeds(store: &Store, seeds: &[NodeId], max_depth: usize) -> Result<Vec<Path>> {
    if seeds.len() < 2 {
        return Ok(Vec::new());
    }
    let map = store.fetch_adjacency(seeds, max_depth)?;
    let mut paths = Vec::new();
    for i in 0..seeds.len() {
        for j in (i + 1)..seeds.len() {
            match bfs_shortest(&map, &seeds[i], &seeds[j], max_depth)
                .or_else(|| bfs_shortest(&map, &seeds[j], &seeds[i], max_depth))
            {
                Some(path) => paths.push(path),
                None => return Ok(Vec::new()),
            }
        }
    }
    Ok(paths)
}
