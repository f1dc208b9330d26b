use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mermaid_agent::{check_diagram, fix_sequence_activations, validate_sequence};

/// Generate a sequence diagram exercising a validation scenario
fn generate_validation_content(lines: usize, scenario: &str) -> String {
    let mut content = String::from("sequenceDiagram\n");

    match scenario {
        "balanced" => {
            for i in 0..lines {
                if i % 2 == 0 {
                    content.push_str(&format!("    Client->>+Server{}: request\n", i % 4));
                } else {
                    content.push_str(&format!("    Server{}-->>-Client: reply\n", (i - 1) % 4));
                }
            }
        }
        "dangling" => {
            for i in 0..lines {
                content.push_str(&format!("    activate P{}\n", i % 10));
            }
        }
        "orphans" => {
            for i in 0..lines {
                if i % 2 == 0 {
                    content.push_str(&format!("    deactivate P{}\n", i % 10));
                } else {
                    content.push_str(&format!("    P{}-->>-Q: stray\n", i % 10));
                }
            }
        }
        "blocks" => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str("    alt ok\n"),
                    1 => content.push_str("    A->>B: yes\n"),
                    2 => content.push_str("    else\n"),
                    3 => content.push_str("    end\n"),
                    _ => unreachable!(),
                }
            }
        }
        _ => {
            for i in 0..lines {
                content.push_str(&format!("    A->>B: {}\n", i));
            }
        }
    }

    content
}

/// Benchmark the activation validator across scenarios
fn bench_validate_sequence(c: &mut Criterion) {
    let scenarios = vec!["balanced", "dangling", "orphans", "blocks"];
    let sizes = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("validate_sequence");

    for scenario in &scenarios {
        for &size in &sizes {
            let content = generate_validation_content(size, scenario);

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(*scenario, size),
                &content,
                |b, content| b.iter(|| black_box(validate_sequence(black_box(content)))),
            );
        }
    }

    group.finish();
}

/// Benchmark the auto-fixer on diagrams needing repairs
fn bench_fix_activations(c: &mut Criterion) {
    let mut group = c.benchmark_group("fix_activations");

    for scenario in ["dangling", "orphans"] {
        let content = generate_validation_content(1_000, scenario);
        group.bench_with_input(
            BenchmarkId::new("fix", scenario),
            &content,
            |b, content| b.iter(|| black_box(fix_sequence_activations(black_box(content)))),
        );
    }

    group.finish();
}

/// Benchmark the whole-diagram structural check
fn bench_check_diagram(c: &mut Criterion) {
    let sequence = generate_validation_content(1_000, "balanced");
    let flowchart: String = std::iter::once("flowchart TD\n".to_string())
        .chain((0..1_000).map(|i| format!("    N{}[Step {}] --> N{}\n", i, i, i + 1)))
        .collect();

    let mut group = c.benchmark_group("check_diagram");

    group.bench_function("sequence", |b| {
        b.iter(|| black_box(check_diagram(black_box(&sequence), None)))
    });
    group.bench_function("flowchart", |b| {
        b.iter(|| black_box(check_diagram(black_box(&flowchart), None)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_validate_sequence,
    bench_fix_activations,
    bench_check_diagram
);
criterion_main!(benches);
