use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rpki_cache::{Cache, Fetcher, Uri};
use rpki_cache_core::CacheConfig;

struct AlwaysOkFetcher;

impl Fetcher for AlwaysOkFetcher {
    fn fetch_subtree(&self, _uri: &Uri) -> i32 {
        0
    }

    fn fetch_object(&self, _uri: &Uri) -> (i32, bool) {
        (0, true)
    }
}

/// Benchmark repeated HTTP-style downloads into a single tree, at
/// increasing fan-out, to profile the descent/materialization loop.
fn bench_cache_download(c: &mut Criterion) {
    let fetcher = AlwaysOkFetcher;

    let mut group = c.benchmark_group("cache_download");

    for object_count in &[100usize, 1_000, 10_000] {
        let temp_dir = std::env::temp_dir().join(format!("rpki_cache_bench_{object_count}"));
        let _ = std::fs::remove_dir_all(&temp_dir);
        std::fs::create_dir_all(&temp_dir).unwrap();
        let config = CacheConfig::new(temp_dir.clone());

        group.bench_with_input(BenchmarkId::from_parameter(object_count), object_count, |b, &object_count| {
            b.iter(|| {
                let mut cache = Cache::prepare(&config);
                for i in 0..object_count {
                    let uri = Uri::parse(&format!("https://h/a{}/obj{}.cer", i % 16, i));
                    black_box(cache.download(&uri, &fetcher));
                }
            });
        });

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    group.finish();
}

criterion_group!(benches, bench_cache_download);
criterion_main!(benches);
