//! Analysis pipeline orchestration with Rayon-based parallelism.
//!
//! Files are parsed in fixed-size batches. Within a batch, reads and parses
//! run on the pool; the aggregator consumes one finished batch at a time.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::analyzer::aggregator::PatternAggregator;
use crate::analyzer::filesystem::discover_source_files;
use crate::analyzer::folders::build_folder_tree;
use crate::analyzer::parser::{parse_file, ParsedFile};
use crate::config::CodeplugConfig;
use crate::models::AnalysisResult;

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    match builder.build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable; parsing sequentially");
            None
        }
    }
}

/// Parse one batch. Files that cannot be read or parsed are dropped.
pub fn parse_batch(
    root: &Path,
    paths: &[String],
    pool: Option<&rayon::ThreadPool>,
) -> Vec<ParsedFile> {
    match pool {
        Some(pool) => pool.install(|| {
            paths
                .par_iter()
                .filter_map(|rel| parse_file(root, rel))
                .collect()
        }),
        None => paths.iter().filter_map(|rel| parse_file(root, rel)).collect(),
    }
}

/// Discover, parse and aggregate every source file under `root`.
pub fn analyze_project(root: &Path, config: &CodeplugConfig) -> AnalysisResult {
    let started = Instant::now();
    let file_paths = discover_source_files(root, &config.analysis);
    let batch_size = config.analysis.effective_batch_size();
    info!(root = %root.display(), files = file_paths.len(), batch_size, "analysis started");

    let pool = build_pool(config.analysis.effective_threads());
    let mut aggregator = PatternAggregator::new(config.structure.clone(), &config.convention);

    let mut parsed_count = 0usize;
    for chunk in file_paths.chunks(batch_size) {
        let batch = parse_batch(root, chunk, pool.as_ref());
        parsed_count += batch.len();
        aggregator.ingest(&batch);
    }

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let tree = build_folder_tree(&root_name, &file_paths);
    aggregator.ingest_structure(&tree, &file_paths);

    let patterns = aggregator.patterns();
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(
        files = file_paths.len(),
        parsed = parsed_count,
        patterns = patterns.len(),
        duration_ms,
        "analysis finished"
    );

    AnalysisResult {
        file_count: file_paths.len(),
        duration_ms,
        patterns,
        folder_structure: tree,
        file_paths,
    }
}
