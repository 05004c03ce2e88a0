use codegraph_core::Result;
use rusqlite::Connection;

/// Current schema version. Bumped only for additive migrations; the store
/// refuses to open a database stamped with a version newer than this one.
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_SCHEMA_VERSION_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
";

const CREATE_NODES_TABLE_V1: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    id          TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    name        TEXT NOT NULL,
    package     TEXT NOT NULL,
    file_path   TEXT NOT NULL,
    start_line  INTEGER NOT NULL,
    end_line    INTEGER NOT NULL,
    exported    INTEGER NOT NULL,
    properties  TEXT NOT NULL DEFAULT '{}'
);
";

const CREATE_EDGES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS edges (
    source_id   TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    kind        TEXT NOT NULL,
    call_count        INTEGER,
    call_sites        TEXT,
    is_type_only      INTEGER,
    imported_symbols  TEXT,
    context           TEXT,
    reference_context TEXT,
    PRIMARY KEY (source_id, target_id, kind)
);
";

const CREATE_INDICES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name);",
    "CREATE INDEX IF NOT EXISTS idx_nodes_file_path ON nodes(file_path);",
    "CREATE INDEX IF NOT EXISTS idx_nodes_package ON nodes(package);",
    "CREATE INDEX IF NOT EXISTS idx_nodes_exported ON nodes(exported);",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);",
    "CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind);",
];

/// Opens (or creates) the schema at the current connection, running any
/// additive migrations needed to reach [`SCHEMA_VERSION`]. Mirrors the
/// versioned migration-ladder pattern used for the document-store schema
/// elsewhere in this lineage: each step is a numbered, idempotent closure
/// applied in order, never a destructive rewrite.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_SCHEMA_VERSION_TABLE)?;

    let current: i64 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    if current == 0 {
        conn.execute_batch(CREATE_NODES_TABLE_V1)?;
        conn.execute_batch(CREATE_EDGES_TABLE)?;
        for stmt in CREATE_INDICES {
            conn.execute_batch(stmt)?;
        }
        conn.execute("ALTER TABLE nodes ADD COLUMN content_hash TEXT", [])
            .or_else(|e| ignore_duplicate_column(e))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        return Ok(());
    }

    if current < 2 {
        conn.execute("ALTER TABLE nodes ADD COLUMN content_hash TEXT", [])
            .or_else(|e| ignore_duplicate_column(e))?;
        conn.execute("UPDATE schema_version SET version = 2", [])?;
    }

    if current > SCHEMA_VERSION {
        return Err(codegraph_core::CodeGraphError::Schema(format!(
            "database schema version {current} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

fn ignore_duplicate_column(e: rusqlite::Error) -> std::result::Result<(), rusqlite::Error> {
    if e.to_string().contains("duplicate column name") {
        Ok(())
    } else {
        Err(e)
    }
}

/// Applies the pragmas the store relies on for durability/throughput:
/// write-ahead logging and a larger page cache, matching the teacher
/// convention of tuning embedded-database connections once at open time.
pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -65536;
        PRAGMA foreign_keys = OFF;
        ",
    )?;
    Ok(())
}
