use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fskv_store::{JsonCodec, Store};
use serde_json::{Value, json};
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Benchmark: Key Resolution & Sandbox Validation
// ============================================================================

fn bench_key_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_resolution");

    let temp = TempDir::new().unwrap();
    let store = Store::builder().root(temp.path()).open().unwrap();

    group.bench_function("flat_key", |b| {
        b.iter(|| {
            black_box(store.resolve("record").unwrap());
        });
    });

    group.bench_function("nested_key", |b| {
        b.iter(|| {
            black_box(store.resolve("orders/new/2024/10/1000").unwrap());
        });
    });

    group.bench_function("rejected_key", |b| {
        b.iter(|| {
            black_box(store.resolve("orders/../../etc/passwd").unwrap_err());
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Record I/O
// ============================================================================

fn payload(entries: usize) -> Value {
    json!({
        "id": 1000,
        "status": "new",
        "items": (0..entries).map(|i| json!({ "sku": format!("sku-{i}"), "qty": i })).collect::<Vec<_>>(),
    })
}

fn bench_record_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_io");
    group.measurement_time(Duration::from_secs(10));

    for entries in [1usize, 100, 1000] {
        let value = payload(entries);
        let size = serde_json::to_vec(&value).map_or(0, |bytes| bytes.len());
        group.throughput(Throughput::Bytes(u64::try_from(size).unwrap_or(u64::MAX)));

        let temp = TempDir::new().unwrap();
        let atomic = Store::builder().root(temp.path().join("atomic")).open().unwrap();
        let direct = Store::builder()
            .root(temp.path().join("direct"))
            .atomic_writes(false)
            .codec(JsonCodec::compact())
            .open()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("put_atomic", entries), &value, |b, value| {
            b.iter(|| atomic.put("orders/new/1000", black_box(value)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("put_direct", entries), &value, |b, value| {
            b.iter(|| direct.put("orders/new/1000", black_box(value)).unwrap());
        });

        group.bench_function(BenchmarkId::new("get", entries), |b| {
            b.iter(|| black_box(atomic.get::<Value>("orders/new/1000").unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Listing & Moves
// ============================================================================

fn bench_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("listing");

    let temp = TempDir::new().unwrap();
    let store = Store::builder().root(temp.path()).open().unwrap();
    for i in 0..500 {
        let state = if i % 2 == 0 { "new" } else { "done" };
        store.put(&format!("orders/{state}/{i}"), &i).unwrap();
    }

    group.bench_function("keys_all", |b| {
        b.iter(|| black_box(store.keys("").unwrap()));
    });

    group.bench_function("keys_prefix", |b| {
        b.iter(|| black_box(store.keys("orders/new").unwrap()));
    });

    group.bench_function("move_roundtrip", |b| {
        b.iter(|| {
            store.move_key("orders/new/0", "orders/archive/0").unwrap().into_result().unwrap();
            store.move_key("orders/archive/0", "orders/new/0").unwrap().into_result().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_key_resolution, bench_record_io, bench_listing);
criterion_main!(benches);
