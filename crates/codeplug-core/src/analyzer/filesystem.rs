//! Source file discovery for analysis and audit passes.

use std::path::Path;

use tracing::debug;

use crate::config::AnalysisConfig;

/// Extensions (without dot) recognised as analysable source.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

pub fn is_source_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Walk `root`, honouring `.gitignore`, the configured include globs and the
/// default plus configured ignore globs. Hidden entries are skipped.
///
/// Returns sorted, root-relative, forward-slash paths of source files.
pub fn discover_source_files(root: &Path, config: &AnalysisConfig) -> Vec<String> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false);

    let threads = config.effective_threads();
    if threads > 0 {
        builder.threads(threads);
    }

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in config.include.iter().filter(|p| !p.trim().is_empty()) {
        if let Err(e) = overrides.add(pattern.trim()) {
            debug!(pattern = %pattern, error = %e, "invalid include glob skipped");
        }
    }
    for pattern in config.effective_ignore() {
        let trimmed = pattern.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        let _ = overrides.add(&format!("!{trimmed}/**"));
        if let Err(e) = overrides.add(&format!("!{trimmed}")) {
            debug!(pattern = %pattern, error = %e, "invalid ignore glob skipped");
        }
    }
    match overrides.build() {
        Ok(built) => {
            builder.overrides(built);
        }
        Err(e) => debug!(error = %e, "override set rejected; walking without overrides"),
    }

    let mut files: Vec<String> = builder
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            is_source_file(&rel).then_some(rel)
        })
        .collect();

    files.sort();
    files
}
