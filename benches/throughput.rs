use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hikelog::{
    core::store::HikeStore,
    hike::{HikeDraft, HikeFields},
    persist::{HIKES_KEY, load_store, memory::MemoryBlobStore, write_collection},
    validate::normalize,
};

fn fields(i: u64) -> HikeFields {
    let draft = HikeDraft {
        name: format!("Trail {i}"),
        location: "Santa Cruz Mountains".to_string(),
        date: "2024-05-01 08:30".to_string(),
        length_km: format!("{}.5", i % 30),
        difficulty: "Medium".to_string(),
        description: "switchbacks".to_string(),
    };
    normalize(&draft, None).expect("valid draft")
}

fn filled_store(n: u64) -> HikeStore {
    let mut store = HikeStore::new();
    for i in 0..n {
        let _ = store.insert(fields(i));
    }
    store
}

fn bench_inserts(c: &mut Criterion) {
    c.bench_function("store_insert_10k", |b| {
        b.iter(|| filled_store(10_000));
    });
}

fn bench_updates(c: &mut Criterion) {
    c.bench_function("store_update_10k", |b| {
        b.iter(|| {
            let mut store = filled_store(10_000);
            for id in store.ids() {
                store.update(&id, fields(7)).expect("update");
            }
        });
    });
}

fn bench_whole_blob_persist(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist_then_load");
    for n in [10u64, 100, 1000] {
        let records = filled_store(n).to_records();
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| {
                let mut blobs = MemoryBlobStore::new();
                write_collection(&mut blobs, HIKES_KEY, records).expect("write");
                load_store(&blobs, HIKES_KEY)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_inserts, bench_updates, bench_whole_blob_persist);
criterion_main!(benches);
