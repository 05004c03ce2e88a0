use crate::types::{AliasMap, NodeKind};
use std::path::Path;

/// Normalizes a file path to the form node identity and cross-file
/// resolution agree on: forward slashes, no leading `./`, relative to the
/// project root.
pub fn normalize_path(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let trimmed = replaced
        .strip_prefix("./")
        .unwrap_or(replaced.as_str())
        .trim_start_matches('/');
    trimmed.to_string()
}

/// Builds the long-form deterministic node id `file[:Kind:dotted.symbol]`.
/// A bare file path (no kind/symbol) is the File node's own id.
pub fn make_id(file_path: &str, kind: Option<NodeKind>, symbol_path: Option<&str>) -> String {
    let file = normalize_path(file_path);
    match (kind, symbol_path) {
        (Some(kind), Some(symbol)) => format!("{file}:{kind}:{symbol}"),
        _ => file,
    }
}

/// Extracts the dotted symbol path from a long-form or short-form node id.
/// Returns `None` for bare file ids.
pub fn extract_symbol(id: &str) -> Option<&str> {
    let mut parts = id.splitn(3, ':');
    let _file = parts.next()?;
    let _kind = parts.next()?;
    parts.next()
}

/// Extracts the file path component shared by both the long and short id
/// forms (everything before the first `:`).
pub fn extract_file(id: &str) -> &str {
    id.split(':').next().unwrap_or(id)
}

/// Normalizes a long-form id to a "pattern" usable for short-form lookup:
/// `file:%:symbol`, matching any kind. Used on read, never on write, per
/// the single-write-form / flexible-read-form decision.
pub fn id_lookup_pattern(file_path: &str, symbol_path: &str) -> String {
    format!("{}:%:{}", normalize_path(file_path), symbol_path)
}

/// Builds the alias map from a synthetic type's generated symbol to the
/// user-facing name it was derived from, e.g. a `ReturnType<typeof f>`
/// synthetic type aliases to `f`'s own return-type alias.
pub fn build_alias_map(pairs: impl IntoIterator<Item = (String, String)>) -> AliasMap {
    pairs.into_iter().collect()
}

/// Normalizes a raw type-annotation string for storage/comparison:
/// collapses any run of whitespace to a single space and trims the ends
/// (§4.1's normalization pipeline; generic brackets are left intact).
pub fn normalize_type_text(raw: &str) -> String {
    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

/// Joins a project-relative path onto a root, returning a normalized
/// relative path string regardless of how the root was spelled.
pub fn relative_to_root(root: &Path, absolute: &Path) -> String {
    let rel = absolute.strip_prefix(root).unwrap_or(absolute);
    normalize_path(&rel.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_strips_dot_slash_and_backslashes() {
        assert_eq!(normalize_path("./src/a.ts"), "src/a.ts");
        assert_eq!(normalize_path("src\\a.ts"), "src/a.ts");
        assert_eq!(normalize_path("/src/a.ts"), "src/a.ts");
    }

    #[test]
    fn make_id_builds_long_form() {
        let id = make_id("src/a.ts", Some(NodeKind::Function), Some("foo"));
        assert_eq!(id, "src/a.ts:Function:foo");
    }

    #[test]
    fn make_id_without_kind_is_bare_file_id() {
        assert_eq!(make_id("src/a.ts", None, None), "src/a.ts");
    }

    #[test]
    fn extract_symbol_and_file_round_trip() {
        let id = "src/a.ts:Method:Foo.bar";
        assert_eq!(extract_file(id), "src/a.ts");
        assert_eq!(extract_symbol(id), Some("Foo.bar"));
    }

    #[test]
    fn extract_symbol_none_for_bare_file_id() {
        assert_eq!(extract_symbol("src/a.ts"), None);
    }

    #[test]
    fn normalize_type_text_collapses_whitespace() {
        assert_eq!(normalize_type_text("  Foo  <  Bar  >  "), "Foo < Bar >");
    }
}
