use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walks `root` collecting every file whose project-relative path matches
/// `include_globs` and none of `exclude_globs`, honoring `.gitignore` along
/// the way — the file-materialization half of the ingestion driver (§4.8
/// step 1), grounded in the teacher's `file_collect::collect_source_files`.
pub fn collect_project_files(
    root: &Path,
    include_globs: &[String],
    exclude_globs: &[String],
) -> Vec<PathBuf> {
    let include_set = build_globset(include_globs);
    let exclude_set = build_globset(exclude_globs);

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true)
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_str = codegraph_core::normalize_path(&relative.to_string_lossy());

        if let Some(excludes) = &exclude_set {
            if excludes.is_match(&relative_str) {
                continue;
            }
        }
        if let Some(includes) = &include_set {
            if !includes.is_match(&relative_str) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }
    debug!("collected {} project files under {:?}", files.len(), root);
    files
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().ok()
}
