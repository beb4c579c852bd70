use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geocache::{CacheBuilder, Coordinate, QuadTree};

fn grid(count: usize) -> Vec<Coordinate> {
    (0..count)
        .map(|i| {
            let lat = -6.5 + (i % 100) as f64 * 0.004;
            let lon = 106.6 + (i / 100) as f64 * 0.004;
            Coordinate::new(lat, lon).unwrap()
        })
        .collect()
}

fn benchmark_geohash(c: &mut Criterion) {
    let mut group = c.benchmark_group("geohash");

    group.bench_function("encode_precision_9", |b| {
        b.iter(|| Coordinate::new(black_box(-6.401994716099995), black_box(106.79402488730072)))
    });

    group.finish();
}

fn benchmark_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");

    for size in [10, 100, 1000] {
        let points = grid(size);

        group.bench_with_input(BenchmarkId::new("insert", size), &points, |b, points| {
            b.iter(|| {
                let mut tree = QuadTree::new();
                for p in points {
                    tree.insert(black_box(p));
                }
                tree
            })
        });

        let mut tree = QuadTree::new();
        for p in &points {
            tree.insert(p);
        }
        let query = Coordinate::new(-6.3571, 106.7281).unwrap();

        group.bench_with_input(BenchmarkId::new("nearest_hash", size), &tree, |b, tree| {
            b.iter(|| tree.nearest_hash(black_box(&query), 5.0))
        });

        let bytes = tree.to_bytes().unwrap();
        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
            b.iter(|| QuadTree::from_bytes(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity_cache");

    let cache = CacheBuilder::new().build().unwrap();
    for (i, p) in grid(200).iter().enumerate() {
        cache
            .insert("weather_api", p, format!("{{\"id\":{}}}", i), 60)
            .unwrap();
    }

    let exact = grid(1).remove(0);
    group.bench_function("lookup_exact", |b| {
        b.iter(|| cache.lookup(black_box("weather_api"), black_box(&exact)))
    });

    let nearby = Coordinate::new(-6.4985, 106.6013).unwrap();
    group.bench_function("lookup_proximity", |b| {
        b.iter(|| cache.lookup(black_box("weather_api"), black_box(&nearby)))
    });

    let point = Coordinate::new(-6.2088, 106.8456).unwrap();
    group.bench_function("insert_merge", |b| {
        b.iter(|| {
            cache
                .insert(black_box("weather_api"), black_box(&point), "{}", 60)
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_geohash,
    benchmark_quadtree,
    benchmark_cache
);
criterion_main!(benches);
