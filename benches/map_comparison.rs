use core::hash::BuildHasher;
use core::hash::Hash;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownMap;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use robin_map::HashMap as RobinMap;
use robin_map::Sentinel;
use siphasher::sip::SipHasher;

#[derive(Clone, Copy, Default)]
struct SipBuilder;

impl BuildHasher for SipBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> SipHasher {
        SipHasher::new()
    }
}

trait BenchItem {
    type Key: Hash + Eq + Sentinel + Clone;
    type Value: Clone;

    fn new(key: u64) -> (Self::Key, Self::Value);
}

struct SmallItem;

impl BenchItem for SmallItem {
    type Key = u64;
    type Value = u64;

    fn new(key: u64) -> (u64, u64) {
        black_box((key, key))
    }
}

struct StringItem;

impl BenchItem for StringItem {
    type Key = String;
    type Value = u64;

    fn new(key: u64) -> (String, u64) {
        black_box((format!("key_{:016X}", key), key))
    }
}

struct LargeItem;

impl BenchItem for LargeItem {
    type Key = String;
    type Value = [u8; 256];

    fn new(key: u64) -> (String, [u8; 256]) {
        let mut value = [0u8; 256];
        for (i, byte) in value.iter_mut().enumerate() {
            *byte = ((key >> ((i % 8) * 8)) & 0xFF) as u8;
        }
        black_box((format!("key_{:064b}", key), value))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 11),
    (1 << 12),
    (1 << 13),
    (1 << 14),
    (1 << 15),
    (1 << 16),
    (1 << 17),
    (1 << 18),
];

type Robin<I> = RobinMap<<I as BenchItem>::Key, <I as BenchItem>::Value, robin_map::DefaultStrategy<SipBuilder>>;
type Hashbrown<I> = HashbrownMap<<I as BenchItem>::Key, <I as BenchItem>::Value, SipBuilder>;

fn random_items<I: BenchItem>(count: usize) -> Vec<(I::Key, I::Value)> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| I::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn sequential_items<I: BenchItem>(range: core::ops::Range<u64>) -> Vec<(I::Key, I::Value)> {
    range.map(I::new).collect()
}

fn robin_filled<I: BenchItem>(items: &[(I::Key, I::Value)]) -> Robin<I> {
    let mut map = Robin::<I>::with_hasher(SipBuilder);
    for (key, value) in items.iter().cloned() {
        map.insert(key, value);
    }
    map
}

fn hashbrown_filled<I: BenchItem>(items: &[(I::Key, I::Value)]) -> Hashbrown<I> {
    let mut map = Hashbrown::<I>::with_hasher(SipBuilder);
    for (key, value) in items.iter().cloned() {
        map.insert(key, value);
    }
    map
}

fn group_name<I>(name: &str) -> String {
    format!("{}_{}", name, core::any::type_name::<I>())
}

fn bench_insert_random<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("insert_random"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = random_items::<I>(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    let mut map = Robin::<I>::with_hasher(SipBuilder);
                    for (key, value) in items {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    let mut map = Hashbrown::<I>::with_hasher(SipBuilder);
                    for (key, value) in items {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_preallocated<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("insert_preallocated"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = random_items::<I>(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || items.clone(),
                |items| {
                    let mut map = Robin::<I>::with_hasher(SipBuilder);
                    map.reserve(size);
                    for (key, value) in items {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || items.clone(),
                |items| {
                    let mut map = Hashbrown::<I>::with_capacity_and_hasher(size, SipBuilder);
                    for (key, value) in items {
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("find_hit"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        let mut keys = items.into_iter().map(|(k, _)| k).collect::<Vec<_>>();
        keys.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(robin.get(key));
                }
            })
        });

        group.bench_function("hashbrown", |b| {
            b.iter(|| {
                for key in keys.iter() {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_miss<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("find_miss"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        let missing = sequential_items::<I>(size as u64..2 * size as u64)
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter(|| {
                for key in missing.iter() {
                    black_box(robin.get(key));
                }
            })
        });

        group.bench_function("hashbrown", |b| {
            b.iter(|| {
                for key in missing.iter() {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_remove<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("remove"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        let mut keys = items.into_iter().map(|(k, _)| k).collect::<Vec<_>>();
        keys.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || robin.clone(),
                |mut map| {
                    for key in keys.iter() {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut map| {
                    for key in keys.iter() {
                        black_box(map.remove(key));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_remove_all<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("remove_all_half"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || robin.clone(),
                |mut map| {
                    let mut toggle = false;
                    black_box(map.remove_all(|_, _| {
                        toggle = !toggle;
                        toggle
                    }));
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut map| {
                    let mut toggle = false;
                    map.retain(|_, _| {
                        toggle = !toggle;
                        !toggle
                    });
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_iteration<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("iteration"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter(|| {
                for entry in robin.iter() {
                    black_box(entry);
                }
            })
        });

        group.bench_function("hashbrown", |b| {
            b.iter(|| {
                for entry in hashbrown.iter() {
                    black_box(entry);
                }
            })
        });
    }

    group.finish();
}

fn bench_drain<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("drain"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&items);
        let hashbrown = hashbrown_filled::<I>(&items);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || robin.clone(),
                |mut map| {
                    for entry in map.drain() {
                        black_box(entry);
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut map| {
                    for entry in map.drain() {
                        black_box(entry);
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

#[derive(Clone, Copy)]
enum Operation {
    Insert,
    Find,
    Remove,
}

fn bench_mixed_zipf<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    for exponent in [1.0, 1.3] {
        let mut group = c.benchmark_group(format!(
            "mixed_zipf_{:.01}_{}",
            exponent,
            core::any::type_name::<I>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        const KEY_SPACE_MULTIPLIER: f32 = 2.0;

        for &size in SIZES[..=MAX_SIZE].iter() {
            let mut rng = SmallRng::from_os_rng();
            let op_distr = Zipf::new(3.0, exponent).unwrap();
            let insert_distr = Zipf::new(size as f32 - 1.0, 1.0).unwrap();
            let lookup_distr = Zipf::new(size as f32 * KEY_SPACE_MULTIPLIER - 1.0, 1.0).unwrap();

            let operations = (0..size * 3)
                .map(|_| {
                    let op_choice: f64 = rng.sample(op_distr);
                    if op_choice <= 1.0 {
                        (Operation::Find, I::new(rng.sample(lookup_distr) as u64))
                    } else if op_choice <= 2.0 {
                        (Operation::Insert, I::new(rng.sample(insert_distr) as u64))
                    } else {
                        (Operation::Remove, I::new(rng.sample(lookup_distr) as u64))
                    }
                })
                .collect::<Vec<_>>();

            group.throughput(Throughput::Elements(operations.len() as u64));
            group.bench_function("robin_map", |b| {
                b.iter_batched(
                    || operations.clone(),
                    |operations| {
                        let mut map = Robin::<I>::with_hasher(SipBuilder);
                        for (operation, (key, value)) in operations {
                            match operation {
                                Operation::Insert => {
                                    black_box(map.insert(key, value));
                                }
                                Operation::Find => {
                                    black_box(map.get(&key));
                                }
                                Operation::Remove => {
                                    black_box(map.remove(&key));
                                }
                            }
                        }
                        black_box(map)
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function("hashbrown", |b| {
                b.iter_batched(
                    || operations.clone(),
                    |operations| {
                        let mut map = Hashbrown::<I>::with_hasher(SipBuilder);
                        for (operation, (key, value)) in operations {
                            match operation {
                                Operation::Insert => {
                                    black_box(map.insert(key, value));
                                }
                                Operation::Find => {
                                    black_box(map.get(&key));
                                }
                                Operation::Remove => {
                                    black_box(map.remove(&key));
                                }
                            }
                        }
                        black_box(map)
                    },
                    BatchSize::SmallInput,
                )
            });
        }

        group.finish();
    }
}

fn bench_churn<I: BenchItem, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(group_name::<I>("churn"));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let initial = sequential_items::<I>(0..size as u64);
        let robin = robin_filled::<I>(&initial);
        let hashbrown = hashbrown_filled::<I>(&initial);

        // Each round removes the oldest key and inserts a fresh one, keeping
        // the population constant while tombstone-free deletion shifts
        // entries back.
        let rounds = (0..size as u64)
            .map(|i| (I::new(i).0, I::new(i + size as u64)))
            .collect::<Vec<_>>();

        group.throughput(Throughput::Elements(size as u64 * 2));
        group.bench_function("robin_map", |b| {
            b.iter_batched(
                || (robin.clone(), rounds.clone()),
                |(mut map, rounds)| {
                    for (old, (key, value)) in rounds {
                        black_box(map.remove(&old));
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function("hashbrown", |b| {
            b.iter_batched(
                || (hashbrown.clone(), rounds.clone()),
                |(mut map, rounds)| {
                    for (old, (key, value)) in rounds {
                        black_box(map.remove(&old));
                        black_box(map.insert(key, value));
                    }
                    black_box(map)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<SmallItem, 8>,
    bench_insert_random::<StringItem, 8>,
    bench_insert_random::<LargeItem, 5>,
    bench_insert_preallocated::<SmallItem, 8>,
    bench_insert_preallocated::<StringItem, 8>,
    bench_insert_preallocated::<LargeItem, 5>,
    bench_find_hit::<SmallItem, 8>,
    bench_find_hit::<StringItem, 8>,
    bench_find_hit::<LargeItem, 5>,
    bench_find_miss::<SmallItem, 8>,
    bench_find_miss::<StringItem, 8>,
    bench_find_miss::<LargeItem, 5>,
    bench_remove::<SmallItem, 8>,
    bench_remove::<StringItem, 8>,
    bench_remove::<LargeItem, 5>,
    bench_remove_all::<SmallItem, 8>,
    bench_remove_all::<StringItem, 8>,
    bench_iteration::<SmallItem, 8>,
    bench_iteration::<StringItem, 8>,
    bench_iteration::<LargeItem, 5>,
    bench_drain::<SmallItem, 8>,
    bench_drain::<StringItem, 8>,
    bench_drain::<LargeItem, 5>,
    bench_mixed_zipf::<SmallItem, 8>,
    bench_mixed_zipf::<StringItem, 8>,
    bench_mixed_zipf::<LargeItem, 5>,
    bench_churn::<SmallItem, 8>,
    bench_churn::<StringItem, 8>,
    bench_churn::<LargeItem, 5>,
);

criterion_main!(benches);
