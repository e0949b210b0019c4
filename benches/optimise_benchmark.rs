//! Performance benchmarks for paramtune
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use paramtune::param::{InstanceMap, Value};
use paramtune::tuning::{block, cpu, sysctl};

fn bench_sysctl_optimise(c: &mut Criterion) {
    let current = Value::text("4096\t16384\t4194304");
    let recommended = Value::text("8192 87380 16777216");

    c.bench_function("sysctl_optimise_multi_field", |b| {
        b.iter(|| sysctl::optimise(black_box(&current), black_box(&recommended)))
    });
}

fn bench_scheduler_optimise(c: &mut Criterion) {
    let choices: Vec<String> = ["mq-deadline", "kyber", "bfq", "none"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let current = Value::text("mq-deadline");

    let mut group = c.benchmark_group("scheduler_optimise");
    for recommended in ["none", "noop, NONE", "cfq, deadline, bfq", "unknown"] {
        let rec = Value::text(recommended);
        group.bench_with_input(BenchmarkId::from_parameter(recommended), &rec, |b, rec| {
            b.iter(|| block::optimise_scheduler(black_box(&current), rec, &choices))
        });
    }
    group.finish();
}

fn bench_instance_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("instance_map");

    for cpus in [4usize, 64, 512] {
        let text: Vec<String> = (0..cpus).map(|i| format!("cpu{}:performance", i)).collect();
        let text = text.join(" ");

        group.bench_with_input(BenchmarkId::new("parse", cpus), &text, |b, text| {
            b.iter(|| InstanceMap::parse(black_box(text)))
        });

        let current = Value::Text(text.clone());
        let recommended = Value::text("powersave");
        group.bench_with_input(BenchmarkId::new("cpu_optimise", cpus), &current, |b, current| {
            b.iter(|| cpu::optimise("governor", black_box(current), &recommended))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sysctl_optimise,
    bench_scheduler_optimise,
    bench_instance_map
);
criterion_main!(benches);
