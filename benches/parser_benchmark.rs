//! Performance benchmarks for line decoding and aggregation
//!
//! Run with: cargo bench

use chrono::{Duration, Local, SecondsFormat, Utc};
use claude_costs::parser::decode_line;
use claude_costs::Aggregator;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use tempfile::TempDir;

/// Generate a session log of user/assistant pairs, optionally with malformed lines.
fn generate_session_jsonl(num_pairs: usize, include_errors: bool) -> String {
    let start = Utc::now() - Duration::hours(1);
    let mut lines = Vec::with_capacity(num_pairs * 2);

    for i in 0..num_pairs {
        let t = start + Duration::milliseconds(i as i64 * 50);
        lines.push(format!(
            r#"{{"uuid":"u{i}","type":"user","timestamp":"{ts}","message":{{"role":"user","content":[{{"type":"tool_result","content":"ok","is_error":false}}]}}}}"#,
            i = i,
            ts = t.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        if include_errors && i % 10 == 5 {
            lines.push("{broken json}".to_string());
        }
        lines.push(format!(
            r#"{{"uuid":"a{i}","parentUuid":"u{i}","type":"assistant","timestamp":"{ts}","message":{{"model":"claude-sonnet-4-20250514","usage":{{"input_tokens":{input},"output_tokens":{output},"cache_creation_input_tokens":{cw},"cache_read_input_tokens":{cr}}}}}}}"#,
            i = i,
            ts = (t + Duration::milliseconds(30)).to_rfc3339_opts(SecondsFormat::Millis, true),
            input = 100 + i,
            output = 200 + i,
            cw = i % 50,
            cr = i % 100
        ));
    }

    lines.join("\n")
}

fn benchmark_decode_line(c: &mut Criterion) {
    let content = generate_session_jsonl(1, false);
    let lines: Vec<&[u8]> = content.lines().map(str::as_bytes).collect();

    c.bench_function("decode_line", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(decode_line(black_box(line)));
            }
        })
    });
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for size in [10, 100, 1000, 10000].iter() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("projects").join("-srv-bench");
        fs::create_dir_all(&project).unwrap();
        let file = project.join("session.jsonl");
        fs::write(&file, generate_session_jsonl(*size, true)).unwrap();
        let files = vec![file];

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let cutoff = Local::now() - Duration::days(30);
            b.iter(|| {
                let mut aggregator = Aggregator::new(cutoff);
                aggregator.process_files(black_box(&files));
                black_box(aggregator.finish())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_decode_line, benchmark_aggregation);
criterion_main!(benches);
