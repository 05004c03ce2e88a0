use crate::schema;
use codegraph_core::{Edge, EdgeKind, Node, NodeId, NodeKind, NodeProperties, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// The persistent graph store: two tables (`nodes`, `edges`) over a single
/// sqlite connection. The store assumes a single writer, matching the
/// concurrency model's "single ingestion writer, many readers" contract;
/// the `Mutex` around the connection serializes writers within one process
/// without requiring callers to reason about it themselves.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if absent) the sqlite database at `path`, applying
    /// pragmas and running schema migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        schema::apply_pragmas(&conn)?;
        schema::initialize(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an in-memory database, used by tests and short-lived queries.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply_pragmas(&conn)?;
        schema::initialize(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Inserts or replaces a batch of nodes within a single transaction.
    pub fn add_nodes(&self, nodes: &[Node]) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO nodes
                    (id, kind, name, package, file_path, start_line, end_line, exported, content_hash, properties)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    kind = excluded.kind,
                    name = excluded.name,
                    package = excluded.package,
                    file_path = excluded.file_path,
                    start_line = excluded.start_line,
                    end_line = excluded.end_line,
                    exported = excluded.exported,
                    content_hash = excluded.content_hash,
                    properties = excluded.properties",
            )?;
            for node in nodes {
                let properties = serde_json::to_string(&node.properties)?;
                stmt.execute(params![
                    node.id,
                    node.kind.to_string(),
                    node.name,
                    node.package,
                    node.file_path,
                    node.start_line,
                    node.end_line,
                    node.exported as i64,
                    node.content_hash,
                    properties,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Inserts or replaces a batch of edges within a single transaction.
    pub fn add_edges(&self, edges: &[Edge]) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO edges
                    (source_id, target_id, kind, call_count, call_sites, is_type_only,
                     imported_symbols, context, reference_context)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(source_id, target_id, kind) DO UPDATE SET
                    call_count = excluded.call_count,
                    call_sites = excluded.call_sites,
                    is_type_only = excluded.is_type_only,
                    imported_symbols = excluded.imported_symbols,
                    context = excluded.context,
                    reference_context = excluded.reference_context",
            )?;
            for edge in edges {
                let call_sites = edge
                    .call_sites
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                let imported_symbols = edge
                    .imported_symbols
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                let context = edge.context.map(serde_json::to_string).transpose()?;
                let reference_context = edge
                    .reference_context
                    .map(serde_json::to_string)
                    .transpose()?;
                stmt.execute(params![
                    edge.source_id,
                    edge.target_id,
                    edge.kind.to_string(),
                    edge.call_count,
                    call_sites,
                    edge.is_type_only.map(|b| b as i64),
                    imported_symbols,
                    context,
                    reference_context,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes edges whose `source_id` belongs to `file_path` (the file's
    /// own id or any `file_path:Kind:symbol` id under it), then deletes the
    /// file's nodes. Incoming edges — rows whose `target_id` is one of this
    /// file's nodes but whose `source_id` belongs to some other file — are
    /// deliberately left in place: per §4.3 they belong to the files that
    /// wrote them, and that file may recreate the target node later in the
    /// same reindexing batch. They become dangling until that happens;
    /// every traversal/resolver query path filters dangling edges via an
    /// inner join against `nodes`.
    pub fn remove_file_nodes(&self, file_path: &str) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let prefix = format!("{file_path}:%");
            tx.execute(
                "DELETE FROM edges WHERE source_id = ?1 OR source_id LIKE ?2",
                params![file_path, prefix],
            )?;
            tx.execute("DELETE FROM nodes WHERE file_path = ?1", params![file_path])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// As [`Store::remove_file_nodes`], but additionally deletes edges
    /// whose `target_id` belongs to `file_path` — used when a file has been
    /// deleted from the project entirely (as opposed to being re-parsed),
    /// so nothing else is left pointing at a file that no longer exists.
    pub fn delete_file(&self, file_path: &str) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let prefix = format!("{file_path}:%");
            tx.execute(
                "DELETE FROM edges WHERE source_id = ?1 OR source_id LIKE ?2
                    OR target_id = ?1 OR target_id LIKE ?2",
                params![file_path, prefix],
            )?;
            tx.execute("DELETE FROM nodes WHERE file_path = ?1", params![file_path])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drops every row from both tables, used by `index --full` / a from-
    /// scratch reindex.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch("DELETE FROM edges; DELETE FROM nodes;")?;
        Ok(())
    }

    /// Returns the stored content hash for a file's own File node, if any
    /// — used by the ingestion driver's hash-compare short-circuit.
    pub fn file_content_hash(&self, file_path: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let hash = conn
            .query_row(
                "SELECT content_hash FROM nodes WHERE file_path = ?1 AND kind = 'File'",
                params![file_path],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(hash)
    }

    /// Fetches a single node by its exact id (long or short form — short
    /// form is matched with a `LIKE` pattern on read only).
    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        if id.contains(":%:") {
            let mut stmt = conn.prepare("SELECT * FROM nodes WHERE id LIKE ?1 LIMIT 1")?;
            let node = stmt
                .query_row(params![id], row_to_node)
                .optional()?;
            Ok(node)
        } else {
            let mut stmt = conn.prepare("SELECT * FROM nodes WHERE id = ?1")?;
            let node = stmt.query_row(params![id], row_to_node).optional()?;
            Ok(node)
        }
    }

    /// Finds every node whose `name` matches exactly, across all files.
    pub fn find_nodes_by_name(&self, name: &str) -> Result<Vec<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT * FROM nodes WHERE name = ?1 ORDER BY file_path")?;
        let nodes = stmt
            .query_map(params![name], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Finds the single node representing a file, by its normalized path.
    pub fn find_file_node(&self, file_path: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT * FROM nodes WHERE file_path = ?1 AND kind = 'File'")?;
        let node = stmt.query_row(params![file_path], row_to_node).optional()?;
        Ok(node)
    }

    /// Loads every node that is either a source or target of at least one
    /// edge touching `seed_ids`, to the given depth, via a recursive CTE.
    /// This is the one place SQL drives multi-hop expansion; the in-memory
    /// traversal core consumes its output as a pre-fetched adjacency map
    /// rather than re-querying per hop.
    pub fn fetch_adjacency(&self, seed_ids: &[NodeId], depth: usize) -> Result<AdjacencyMap> {
        if seed_ids.is_empty() || depth == 0 {
            return Ok(AdjacencyMap::default());
        }
        let conn = self.conn.lock().expect("store mutex poisoned");
        let seeds_json = serde_json::to_string(seed_ids)?;

        let mut stmt = conn.prepare(
            "WITH RECURSIVE reachable(id, dist) AS (
                SELECT value, 0 FROM json_each(?1)
                UNION
                SELECT e.target_id, reachable.dist + 1
                FROM edges e
                JOIN reachable ON e.source_id = reachable.id
                WHERE reachable.dist < ?2
                UNION
                SELECT e.source_id, reachable.dist + 1
                FROM edges e
                JOIN reachable ON e.target_id = reachable.id
                WHERE reachable.dist < ?2
             )
             SELECT DISTINCT e.source_id, e.target_id, e.kind,
                    e.call_count, e.call_sites, e.is_type_only,
                    e.imported_symbols, e.context, e.reference_context
             FROM edges e
             JOIN reachable rs ON e.source_id = rs.id
             JOIN reachable rt ON e.target_id = rt.id
             JOIN nodes ns ON ns.id = e.source_id
             JOIN nodes nt ON nt.id = e.target_id",
        )?;

        let edges: Vec<Edge> = stmt
            .query_map(params![seeds_json, depth as i64], row_to_edge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut map = AdjacencyMap::default();
        for edge in edges {
            map.outgoing
                .entry(edge.source_id.clone())
                .or_default()
                .push(edge.clone());
            map.incoming.entry(edge.target_id.clone()).or_default().push(edge);
        }
        Ok(map)
    }

    /// Loads the full outgoing/incoming adjacency for every node in the
    /// graph. Used by traversal operations whose bound isn't naturally
    /// seed-local (e.g. bidirectional shortest path between two arbitrary
    /// nodes) — acceptable per the spec's "single-machine, bounded corpus"
    /// resource model.
    pub fn fetch_full_adjacency(&self) -> Result<AdjacencyMap> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT e.source_id, e.target_id, e.kind, e.call_count, e.call_sites,
                    e.is_type_only, e.imported_symbols, e.context, e.reference_context
             FROM edges e
             JOIN nodes ns ON ns.id = e.source_id
             JOIN nodes nt ON nt.id = e.target_id",
        )?;
        let edges: Vec<Edge> = stmt
            .query_map([], row_to_edge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut map = AdjacencyMap::default();
        for edge in edges {
            map.outgoing
                .entry(edge.source_id.clone())
                .or_default()
                .push(edge.clone());
            map.incoming.entry(edge.target_id.clone()).or_default().push(edge);
        }
        Ok(map)
    }

    /// Returns `content_hash` for every node currently stored under
    /// `file_path`, keyed by id — the "per-ID dictionary fetched before
    /// extraction" the ingestion driver compares new hashes against to
    /// decide whether a file can be skipped (§4.8 step 2).
    pub fn node_content_hashes(&self, file_path: &str) -> Result<HashMap<NodeId, Option<String>>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT id, content_hash FROM nodes WHERE file_path = ?1")?;
        let rows = stmt
            .query_map(params![file_path], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Finds a node by exact `name` scoped to one file, used by the
    /// cross-file import-map resolution pass to turn a named import into a
    /// concrete target id.
    pub fn find_node_by_name_in_file(&self, file_path: &str, name: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT * FROM nodes WHERE file_path = ?1 AND name = ?2 LIMIT 1")?;
        let node = stmt.query_row(params![file_path, name], row_to_node).optional()?;
        Ok(node)
    }

    /// Finds every `Method` node belonging to `class_name` within one file,
    /// ordered by declaration order — used by the resolver's class-method
    /// fallback (§4.5 step 4) to list or uniquely resolve a class's methods.
    pub fn find_methods_of_class(&self, file_path: &str, class_name: &str) -> Result<Vec<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let prefix = format!("{file_path}:Method:{class_name}.%");
        let mut stmt = conn.prepare(
            "SELECT * FROM nodes WHERE file_path = ?1 AND kind = 'Method' AND id LIKE ?2
             ORDER BY start_line",
        )?;
        let nodes = stmt
            .query_map(params![file_path, prefix], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Finds nodes whose `name` contains `fragment` (case-sensitive
    /// substring), used to build the resolver's fuzzy `NotFound`
    /// suggestions (§4.5 step 3) before ranking by Levenshtein distance.
    pub fn find_nodes_by_name_substring(&self, fragment: &str) -> Result<Vec<Node>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let pattern = format!("%{fragment}%");
        let mut stmt = conn.prepare("SELECT * FROM nodes WHERE name LIKE ?1 ORDER BY name")?;
        let nodes = stmt
            .query_map(params![pattern], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    pub fn node_count(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Pre-loaded outgoing/incoming edge lists keyed by node id, as returned by
/// [`Store::fetch_adjacency`]. The traversal core walks this in memory
/// rather than issuing one query per hop.
#[derive(Debug, Default, Clone)]
pub struct AdjacencyMap {
    pub outgoing: HashMap<NodeId, Vec<Edge>>,
    pub incoming: HashMap<NodeId, Vec<Edge>>,
}

fn row_to_node(row: &rusqlite::Row<'_>) -> rusqlite::Result<Node> {
    let kind_str: String = row.get("kind")?;
    let kind = NodeKind::from_str(&kind_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(InvalidKind(e)))
    })?;
    let properties_str: String = row.get("properties")?;
    let properties: NodeProperties = serde_json::from_str(&properties_str).unwrap_or_default();

    Ok(Node {
        id: row.get("id")?,
        kind,
        name: row.get("name")?,
        package: row.get("package")?,
        file_path: row.get("file_path")?,
        start_line: row.get("start_line")?,
        end_line: row.get("end_line")?,
        exported: row.get::<_, i64>("exported")? != 0,
        content_hash: row.get("content_hash")?,
        properties,
    })
}

fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Edge> {
    let kind_str: String = row.get(2)?;
    let kind = EdgeKind::from_str(&kind_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(InvalidKind(e)))
    })?;
    let call_sites: Option<String> = row.get(4)?;
    let imported_symbols: Option<String> = row.get(6)?;
    let context: Option<String> = row.get(7)?;
    let reference_context: Option<String> = row.get(8)?;

    Ok(Edge {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        kind,
        call_count: row.get(3)?,
        call_sites: call_sites.and_then(|s| serde_json::from_str(&s).ok()),
        is_type_only: row.get::<_, Option<i64>>(5)?.map(|v| v != 0),
        imported_symbols: imported_symbols.and_then(|s| serde_json::from_str(&s).ok()),
        context: context.and_then(|s| serde_json::from_str(&s).ok()),
        reference_context: reference_context.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

#[derive(Debug)]
struct InvalidKind(String);

impl std::fmt::Display for InvalidKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvalidKind {}
