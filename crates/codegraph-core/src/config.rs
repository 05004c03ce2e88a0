use crate::error::{CodeGraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for the indexer: where to look for source files,
/// where the graph database lives, and the traversal/formatting defaults.
/// Loaded from an optional `codegraph.toml` layered with `CODEGRAPH_*`
/// environment overrides, in the teacher's `config`-crate idiom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub project_root: PathBuf,
    pub database_path: PathBuf,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub default_traversal_depth: usize,
    pub max_k_paths: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            database_path: PathBuf::from(".codegraph/graph.sqlite"),
            include_globs: vec!["**/*.ts".to_string(), "**/*.tsx".to_string()],
            exclude_globs: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/*.d.ts".to_string(),
            ],
            default_traversal_depth: 3,
            max_k_paths: 5,
        }
    }
}

impl IndexerConfig {
    /// Loads configuration from `<project_root>/codegraph.toml` if present,
    /// layered with `CODEGRAPH_*` environment variable overrides, falling
    /// back to defaults when no file exists.
    pub fn load(project_root: &std::path::Path) -> Result<Self> {
        let config_path = project_root.join("codegraph.toml");

        let builder = config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(config::Environment::with_prefix("CODEGRAPH").separator("__"));

        let settings = builder.build().map_err(CodeGraphError::from)?;

        let mut cfg: IndexerConfig = settings
            .try_deserialize()
            .unwrap_or_else(|_| IndexerConfig::default());
        cfg.project_root = project_root.to_path_buf();
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_typescript_globs() {
        let cfg = IndexerConfig::default();
        assert!(cfg.include_globs.iter().any(|g| g.ends_with(".ts")));
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = IndexerConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.default_traversal_depth, 3);
        assert_eq!(cfg.project_root, dir.path());
    }
}
