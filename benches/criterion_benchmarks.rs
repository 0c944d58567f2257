use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rescache::{LruStorage, OrderedMap};

fn fill_ordered_map(cap: usize) -> OrderedMap<usize, usize> {
    let mut map = OrderedMap::new();
    for i in 0..cap {
        map.insert(i, i);
    }
    map
}

fn fill_lru_storage(cap: usize) -> LruStorage<usize, u64> {
    let mut storage = LruStorage::new(u64::MAX);
    for i in 0..cap {
        storage.insert(i, i as u64);
    }
    storage
}

pub fn ordered_map_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("OrderedMap");

    let map = fill_ordered_map(CACHE_SIZE);
    group.bench_function("get hit", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(map.get(&(i % CACHE_SIZE)));
            }
        });
    });

    group.bench_function("get miss", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(map.get(&(i + CACHE_SIZE)));
            }
        });
    });

    let mut touch_map = fill_ordered_map(CACHE_SIZE);
    group.bench_function("touch", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(touch_map.touch(&(i % CACHE_SIZE)));
            }
        });
    });

    group.finish();
}

pub fn lru_storage_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("LruStorage");

    let storage = fill_lru_storage(CACHE_SIZE);
    group.bench_function("get hit", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(storage.get(&(i % CACHE_SIZE)));
            }
        });
    });

    group.bench_function("insert with eviction", |b| {
        let mut storage: LruStorage<usize, u64> = LruStorage::new((CACHE_SIZE as u64) * 8);
        b.iter(|| {
            for i in 0..100 {
                black_box(storage.insert(i % CACHE_SIZE, 8));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, ordered_map_benchmark, lru_storage_benchmark);
criterion_main!(benches);
