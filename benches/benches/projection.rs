// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_projection::{
    IRect, MemoryTileStore, PixelLayout, ProjectionCache, RegionSet, RenderError, RenderFn,
    TileGrid,
};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_i32(&mut self, upper_exclusive: i32) -> i32 {
        if upper_exclusive <= 0 {
            return 0;
        }
        (self.next_u32() % upper_exclusive as u32) as i32
    }
}

fn random_rects(count: usize, extent: i32, max_size: i32, seed: u64) -> Vec<IRect> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|_| {
            IRect::new(
                rng.gen_range_i32(extent),
                rng.gen_range_i32(extent),
                1 + rng.gen_range_i32(max_size),
                1 + rng.gen_range_i32(max_size),
            )
        })
        .collect()
}

fn fill(rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError> {
    let row_bytes = rect.width as usize * layout.bytes_per_pixel;
    for row in 0..rect.height as usize {
        let start = row * layout.stride;
        dest[start..start + row_bytes].fill(0x55);
    }
    Ok(())
}

type FillFn = fn(IRect, &mut [u8], PixelLayout) -> Result<(), RenderError>;

fn build_cache(extent: i32, tile: i32) -> ProjectionCache<RenderFn<FillFn>, MemoryTileStore> {
    let renderer: FillFn = fill;
    let store = MemoryTileStore::new(TileGrid::new(tile, tile), 4);
    let mut cache = ProjectionCache::new(RenderFn(renderer), store);
    cache
        .configure(extent, extent, tile, tile)
        .expect("tile size is positive");
    cache
}

fn bench_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_projection/region");
    group.sample_size(50);

    for &count in &[64_usize, 512, 2_048] {
        let rects = random_rects(count, 4_096, 128, 0x5EED_0000_0000_0001);
        group.bench_function(format!("union(n={count})"), |b| {
            b.iter(|| {
                let region: RegionSet = rects.iter().copied().collect();
                black_box(region);
            });
        });

        let region: RegionSet = rects.iter().copied().collect();
        group.bench_function(format!("intersect_copy(n={count})"), |b| {
            b.iter(|| {
                black_box(region.intersect_copy(IRect::new(1_024, 1_024, 256, 256)));
            });
        });
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_projection/cache");
    group.sample_size(30);

    for &extent in &[1_024_i32, 4_096] {
        let rects = random_rects(256, extent, 64, 0x5EED_0000_0000_0002);

        group.bench_function(format!("invalidate(extent={extent},n=256)"), |b| {
            b.iter_batched(
                || build_cache(extent, 256),
                |mut cache| {
                    for rect in &rects {
                        cache.invalidate_rect(*rect).expect("cache is configured");
                    }
                    black_box(cache);
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("validate_all(extent={extent},n=256)"), |b| {
            b.iter_batched(
                || {
                    let mut cache = build_cache(extent, 256);
                    for rect in &rects {
                        cache.invalidate_rect(*rect).expect("cache is configured");
                    }
                    cache
                },
                |mut cache| {
                    let tiles = cache.validate_all().expect("renderer never fails");
                    black_box(tiles);
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("fetch_clean(extent={extent})"), |b| {
            let mut cache = build_cache(extent, 256);
            cache.validate_all().expect("renderer never fails");
            b.iter(|| {
                black_box(cache.fetch(1, 1, 0).expect("cache is configured"));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_region, bench_cache);
criterion_main!(benches);
