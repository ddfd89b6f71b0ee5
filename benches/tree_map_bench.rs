use assoc_containers::TreeMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (TreeMap<String, u64>, Vec<String>) {
    let mut m = TreeMap::new();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64).unwrap();
    }
    (m, keys)
}

fn pick(keys: &[String], count: usize) -> Vec<String> {
    let n = keys.len();
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..count)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            keys[(s as usize) % n].clone()
        })
        .collect()
}

fn bench_insert_random_100k(c: &mut Criterion) {
    c.bench_function("tree::insert_random_100k", |b| {
        b.iter_batched(
            TreeMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_ascending_100k(c: &mut Criterion) {
    c.bench_function("tree::insert_ascending_u64_100k", |b| {
        b.iter_batched(
            || {
                let mut m = TreeMap::<u64, u64>::new();
                m.reserve(100_000).unwrap();
                m
            },
            |mut m| {
                for i in 0..100_000u64 {
                    m.insert(i, i).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("tree::find_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        let queries = pick(&keys, 10_000);
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("tree::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                let to_erase = pick(&keys, 10_000);
                (m, to_erase)
            },
            |(mut m, to_erase)| {
                for k in &to_erase {
                    m.erase(k.as_str());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_range_walks(c: &mut Criterion) {
    c.bench_function("tree::range_1k_windows_on_100k", |b| {
        let m: TreeMap<u64, u64> = (0..100_000u64).map(|k| (k, k)).collect();
        let starts: Vec<u64> = lcg(17).take(1_000).map(|x| x % 99_000).collect();
        b.iter(|| {
            let mut sum = 0u64;
            for &lo in &starts {
                let stop = m.first_at_or_after(&(lo + 1_000));
                let mut cur = m.first_at_or_after(&lo);
                while cur != stop {
                    sum = sum.wrapping_add(*m.value(cur).unwrap_or(&0));
                    cur = m.next(cur);
                }
            }
            black_box(sum)
        })
    });

    c.bench_function("tree::iter_rev_all_100k", |b| {
        let (m, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter().rev() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_random_100k, bench_insert_ascending_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_find_hit_10k,
              bench_erase_random_10k,
              bench_range_walks
}
criterion_main!(benches_insert, benches_ops);
