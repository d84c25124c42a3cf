//! Performance benchmarks for native-id lookups vs registry fallback

use common::Security;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use security_cache::{ExtensionKeyDeriver, NativeIdStorage, SecurityStorage};
use std::sync::Arc;
use storage::InMemorySecurityRegistry;
use test_utils::{SecurityFactory, ZERODHA_TOKEN_KEY};

fn hydrated_cache(size: u32) -> Option<NativeIdStorage<ExtensionKeyDeriver<u32>>> {
    let registry = match InMemorySecurityRegistry::with_securities(SecurityFactory::new().batch(size, 0)) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Benchmark setup error: Failed to seed registry: {e}");
            return None;
        }
    };
    match NativeIdStorage::new(Arc::new(registry), ExtensionKeyDeriver::new(ZERODHA_TOKEN_KEY)) {
        Ok(cache) => Some(cache),
        Err(e) => {
            eprintln!("Benchmark setup error: Failed to hydrate cache: {e}");
            None
        }
    }
}

fn benchmark_lookup_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let factory = SecurityFactory::new();

    for size in [1_000_u32, 10_000, 100_000] {
        let Some(cache) = hydrated_cache(size) else {
            return;
        };
        group.throughput(Throughput::Elements(1));

        group.bench_with_input(BenchmarkId::new("native_id_hit", size), &size, |b, &size| {
            let criteria = factory.token_criteria(size / 2);
            b.iter(|| black_box(cache.lookup(black_box(&criteria))));
        });

        group.bench_with_input(BenchmarkId::new("native_id_get", size), &size, |b, &size| {
            let token = size / 2;
            b.iter(|| black_box(cache.get(black_box(&token))));
        });

        group.bench_with_input(BenchmarkId::new("registry_fallback", size), &size, |b, &size| {
            let mut criteria = Security::criteria();
            criteria.id = format!("SYM{}@NFO", size / 2);
            b.iter(|| black_box(cache.lookup(black_box(&criteria))));
        });
    }

    group.finish();
}

fn benchmark_hydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydration");

    for size in [10_000_u32, 100_000] {
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_function(format!("hydrate_{size}"), |b| {
            b.iter(|| black_box(hydrated_cache(size).map(|cache| cache.count())));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_lookup_paths, benchmark_hydration);
criterion_main!(benches);
