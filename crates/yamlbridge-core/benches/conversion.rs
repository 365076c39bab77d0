use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use yamlbridge_core::{json_to_yaml, yaml_to_json};

/// A manifest-shaped document with `services` entries.
fn manifest(services: usize) -> String {
    let mut yaml = String::from("version: 3\nservices:\n");
    for i in 0..services {
        yaml.push_str(&format!(
            "- name: svc-{i}\n  image: registry.local/svc:{i}.0\n  replicas: {}\n  ports:\n  - 80\n  - 443\n  env:\n    LOG_LEVEL: info\n    ENABLED: \"true\"\n",
            i % 5 + 1
        ));
    }
    yaml
}

fn bench_yaml_to_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("yaml_to_json");
    for services in [10, 100, 1000] {
        let yaml = manifest(services);
        group.throughput(Throughput::Bytes(yaml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(services), &yaml, |b, yaml| {
            b.iter(|| yaml_to_json(black_box(yaml)).unwrap())
        });
    }
    group.finish();
}

fn bench_json_to_yaml(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_to_yaml");
    for services in [10, 100, 1000] {
        let json = yaml_to_json(manifest(services)).unwrap();
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(services), &json, |b, json| {
            b.iter(|| json_to_yaml(black_box(json)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_yaml_to_json, bench_json_to_yaml);
criterion_main!(benches);
