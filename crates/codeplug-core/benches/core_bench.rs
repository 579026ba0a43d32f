//! Criterion benchmarks for codeplug-core.
//!
//! ## Benchmark groups
//!
//! 1. **schema**: score store DDL and migration overhead.
//! 2. **visitors**: the full visitor registry over parsed files.
//! 3. **aggregation**: project-wide analysis on a synthetic tree.
//! 4. **drift**: diff parsing and classification.
//! 5. **scoring**: compliance arithmetic and trend rendering.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/codeplug-core/Cargo.toml
//! # Run only the drift group:
//! cargo bench --manifest-path crates/codeplug-core/Cargo.toml -- drift
//! ```

use std::path::Path;

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusqlite::Connection;

use codeplug_core::analyzer::parser::parse_source;
use codeplug_core::analyzer::pipeline::analyze_project;
use codeplug_core::analyzer::visitors::VisitorRegistry;
use codeplug_core::config::CodeplugConfig;
use codeplug_core::drift::{parse_unified_diff, DriftClassifier};
use codeplug_core::models::{
    convention_id, Convention, Dimension, ScoreRecord, Severity, SeverityBreakdown, Violation,
};
use codeplug_core::scorer::{ComplianceScorer, TrendTracker};
use codeplug_core::store::schema::{init_schema, migrate_schema, SCHEMA_STATEMENTS};

const COMPONENT_SRC: &str = r#"
import React, { useState } from 'react';
import { Button } from '../shared';

export const MAX_ITEMS = 20;

export default function UserCard({ user }: { user: { name: string } }) {
  const [open, setOpen] = useState(false);
  return <div onClick={() => setOpen(!open)}><Button>{user.name}</Button></div>;
}
"#;

const SERVICE_SRC: &str = r#"
import type { User } from './types';

export class UserService {
  async load(id: string): Promise<User | null> {
    try {
      const res = await fetch(`/users/${id}`);
      return await res.json();
    } catch (err) {
      return null;
    }
  }
}
"#;

fn write_project(root: &Path, n_files: usize) {
    for i in 0..n_files {
        let (rel, src) = if i % 2 == 0 {
            (format!("src/components/feature{}/UserCard{i}.tsx", i / 10), COMPONENT_SRC)
        } else {
            (format!("src/services/UserService{i}.ts"), SERVICE_SRC)
        };
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, src).unwrap();
    }
}

fn synthetic_diff(files: usize) -> String {
    let mut diff = String::new();
    for i in 0..files {
        diff.push_str(&format!(
            "diff --git a/src/mod{i}.ts b/src/mod{i}.ts\n--- a/src/mod{i}.ts\n+++ b/src/mod{i}.ts\n\
             @@ -0,0 +1,4 @@\n+const user_name{i} = 'x';\n+export default function load{i}() {{}}\n\
             +import {{ a }} from '../../shared/a';\n+async function fetch{i}() {{ await go(); }}\n"
        ));
    }
    diff
}

fn conventions() -> Vec<Convention> {
    [
        (Dimension::Naming, "Use camelCase for variables and functions"),
        (Dimension::Structure, "Use named exports instead of default export"),
        (Dimension::Imports, "Barrel imports (index re-exports)"),
        (Dimension::ErrorHandling, "Try/catch error handling"),
    ]
    .into_iter()
    .map(|(dimension, rule)| Convention {
        id: convention_id(dimension, rule),
        dimension,
        rule: rule.to_string(),
        confidence: 90,
        confirmed: true,
        examples: vec![],
        severity: Severity::Medium,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// 1. schema
// ---------------------------------------------------------------------------

fn bench_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema");
    group.bench_function("init_schema_in_memory", |b| {
        b.iter(|| {
            let conn = Connection::open_in_memory().unwrap();
            init_schema(&conn).unwrap();
            black_box(conn);
        });
    });
    group.bench_function("migrate_on_current", |b| {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        migrate_schema(&conn).unwrap();
        b.iter(|| migrate_schema(black_box(&conn)).unwrap());
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. visitors
// ---------------------------------------------------------------------------

fn bench_visitors(c: &mut Criterion) {
    let mut group = c.benchmark_group("visitors");
    let registry = VisitorRegistry::with_defaults();
    let component = parse_source("src/components/UserCard.tsx", COMPONENT_SRC.to_string()).unwrap();
    let service = parse_source("src/services/UserService.ts", SERVICE_SRC.to_string()).unwrap();

    group.bench_function("parse_component", |b| {
        b.iter(|| parse_source("UserCard.tsx", black_box(COMPONENT_SRC).to_string()));
    });
    group.bench_function("registry_component", |b| {
        b.iter(|| registry.run_all(black_box(&component)));
    });
    group.bench_function("registry_service", |b| {
        b.iter(|| registry.run_all(black_box(&service)));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. aggregation
// ---------------------------------------------------------------------------

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    group.sample_size(10);
    for n in [50usize, 200] {
        let tmp = tempfile::tempdir().unwrap();
        write_project(tmp.path(), n);
        let config = CodeplugConfig::default();
        group.bench_with_input(BenchmarkId::new("analyze_project", n), &n, |b, _| {
            b.iter(|| analyze_project(black_box(tmp.path()), &config));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 4. drift
// ---------------------------------------------------------------------------

fn bench_drift(c: &mut Criterion) {
    let mut group = c.benchmark_group("drift");
    let classifier = DriftClassifier::default();
    let conventions = conventions();
    for files in [10usize, 100] {
        let diff = synthetic_diff(files);
        group.bench_with_input(BenchmarkId::new("parse_unified_diff", files), &diff, |b, d| {
            b.iter(|| parse_unified_diff(black_box(d)));
        });
        group.bench_with_input(BenchmarkId::new("classify_diff", files), &diff, |b, d| {
            b.iter(|| classifier.classify_diff(black_box(d), &conventions));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 5. scoring
// ---------------------------------------------------------------------------

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let violations: Vec<Violation> = (0..500)
        .map(|i| Violation {
            id: format!("v{i}"),
            convention_id: "naming-utility-files-use-camelcase".into(),
            severity: Severity::ALL[i % 4],
            file: format!("src/file_{i}.ts"),
            line: None,
            message: "m".into(),
            expected: format!("file{i}.ts"),
            found: format!("file_{i}.ts"),
            auto_fixable: true,
        })
        .collect();
    let scorer = ComplianceScorer::default();
    group.bench_function("calculate_500", |b| {
        b.iter(|| scorer.calculate(black_box(&violations)));
    });

    let now = Utc::now();
    let history: Vec<ScoreRecord> = (0..50)
        .map(|i| ScoreRecord {
            id: format!("r{i}"),
            project_hash: "bench".into(),
            score: (40 + i % 60) as u32,
            breakdown: SeverityBreakdown::default(),
            created_at: now - Duration::days(50 - i as i64),
        })
        .collect();
    group.bench_function("compute_trend", |b| {
        b.iter(|| TrendTracker::compute_trend(black_box(&history)));
    });
    group.bench_function("render_trend_chart", |b| {
        b.iter(|| TrendTracker::render_trend_chart(black_box(&history)));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_schema,
    bench_visitors,
    bench_aggregation,
    bench_drift,
    bench_scoring,
);
criterion_main!(benches);
