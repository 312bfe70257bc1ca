// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-path validation of base-level tiles.

use crate::error::CacheError;
use crate::region::RegionSet;
use crate::render::{PixelLayout, Renderer};
use crate::stats::CacheStats;
use crate::store::{Tile, TileStore};
use crate::tile::{TileCoord, TileGrid};
use crate::tracker::DirtyTracker;

/// Brings base-level tiles up to date before they are handed out.
///
/// A fetch of a base tile asks the [`DirtyTracker`] which parts of the tile
/// footprint are stale, renders exactly those rectangles into the tile and
/// then marks them clean. A tile with nothing stale is returned untouched.
/// Tiles on coarser levels pass straight through to the store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileValidator {
    grid: TileGrid,
}

impl TileValidator {
    /// Creates a validator for tiles of `grid` size.
    #[must_use]
    pub fn new(grid: TileGrid) -> Self {
        Self { grid }
    }

    /// Returns the tile grid.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    /// Replaces the tile grid.
    pub fn set_grid(&mut self, grid: TileGrid) {
        self.grid = grid;
    }

    /// Returns the tile at `coord`, re-rendering its stale parts first if it
    /// is a base-level tile.
    ///
    /// On error nothing is returned and every rectangle that was not
    /// rendered successfully stays dirty in `tracker`. Rectangles rendered
    /// before the failure are marked clean.
    pub fn fetch<S, R>(
        &self,
        coord: TileCoord,
        tracker: &mut DirtyTracker,
        store: &mut S,
        renderer: &R,
        stats: &mut CacheStats,
    ) -> Result<S::Tile, CacheError>
    where
        S: TileStore + ?Sized,
        R: Renderer + ?Sized,
    {
        if coord.level != 0 {
            return Ok(store.get_or_create(coord));
        }

        let footprint = self.grid.footprint(coord.col, coord.row);
        let stale = tracker.query(footprint);
        if stale.is_empty() {
            stats.fast_path_hits = stats.fast_path_hits.wrapping_add(1);
            tracing::trace!(?coord, "tile is valid");
            return Ok(store.get_or_create(coord));
        }

        let tile = store.get_or_create(coord);
        let layout = PixelLayout::new(tile.stride(), tile.bytes_per_pixel());
        let mut rendered = RegionSet::new();
        let mut failure = None;
        {
            let mut pixels = tile.lock_for_write();
            let tile_width = self.grid.tile_width as usize;
            let tile_height = self.grid.tile_height as usize;
            let row_bytes = tile_width * layout.bytes_per_pixel;
            // The whole footprint must fit, or rows would land at the wrong offsets.
            let required = layout.span(tile_width, tile_height).max(row_bytes * tile_height);
            if layout.stride < row_bytes || pixels.len() < required {
                tracing::warn!(
                    ?coord,
                    stride = layout.stride,
                    len = pixels.len(),
                    "tile buffer too small"
                );
                return Err(CacheError::TileBufferTooSmall {
                    coord,
                    len: pixels.len(),
                    required,
                });
            }
            for rect in stale.rectangles() {
                let offset = layout.offset(
                    (rect.x - footprint.x) as usize,
                    (rect.y - footprint.y) as usize,
                );
                let required = offset + layout.span(rect.width as usize, rect.height as usize);
                if pixels.len() < required {
                    failure = Some(CacheError::TileBufferTooSmall {
                        coord,
                        len: pixels.len(),
                        required,
                    });
                    break;
                }
                match renderer.render(rect, &mut pixels[offset..required], layout) {
                    Ok(()) => {
                        rendered.union(rect);
                        stats.rendered_rects = stats.rendered_rects.wrapping_add(1);
                    }
                    Err(err) => {
                        stats.render_failures = stats.render_failures.wrapping_add(1);
                        tracing::warn!(?coord, %err, "render failed, area stays dirty");
                        failure = Some(CacheError::Render(err));
                        break;
                    }
                }
            }
        }
        tracker.clear_set(&rendered);

        if let Some(err) = failure {
            return Err(err);
        }
        stats.revalidated_tiles = stats.revalidated_tiles.wrapping_add(1);
        tracing::debug!(?coord, rects = stale.len(), "revalidated tile");
        Ok(tile)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::rect::IRect;
    use crate::render::RenderError;
    use crate::stores::memory::MemoryTileStore;

    /// Fills rendered pixels with `0xAA` and counts calls.
    #[derive(Default)]
    struct Fill {
        calls: Cell<u32>,
        fail_on: Option<IRect>,
    }

    impl Renderer for Fill {
        fn render(&self, rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_on.is_some_and(|bad| bad.intersects(&rect)) {
                return Err(RenderError::new(rect, "refused"));
            }
            for row in 0..rect.height as usize {
                let start = row * layout.stride;
                dest[start..start + rect.width as usize * layout.bytes_per_pixel].fill(0xAA);
            }
            Ok(())
        }
    }

    fn setup() -> (TileValidator, DirtyTracker, MemoryTileStore) {
        let grid = TileGrid::new(8, 8);
        (
            TileValidator::new(grid),
            DirtyTracker::new(32, 32),
            MemoryTileStore::new(grid, 1),
        )
    }

    #[test]
    fn renders_only_stale_pixels_at_the_right_offset() {
        let (validator, mut tracker, mut store) = setup();
        let renderer = Fill::default();
        let mut stats = CacheStats::default();
        tracker.mark_dirty(IRect::new(10, 9, 2, 3));

        let tile = validator
            .fetch(TileCoord::base(1, 1), &mut tracker, &mut store, &renderer, &mut stats)
            .unwrap();
        let pixels = tile.lock_for_read();
        for y in 0..8 {
            for x in 0..8 {
                let stale = (2..4).contains(&x) && (1..4).contains(&y);
                assert_eq!(pixels[y * 8 + x] == 0xAA, stale, "pixel ({x}, {y})");
            }
        }
        assert!(tracker.is_clean());
        assert_eq!(stats.revalidated_tiles, 1);
    }

    #[test]
    fn second_fetch_takes_fast_path() {
        let (validator, mut tracker, mut store) = setup();
        let renderer = Fill::default();
        let mut stats = CacheStats::default();
        tracker.mark_all();

        let coord = TileCoord::base(0, 0);
        validator.fetch(coord, &mut tracker, &mut store, &renderer, &mut stats).unwrap();
        let calls = renderer.calls.get();
        assert!(calls > 0);
        validator.fetch(coord, &mut tracker, &mut store, &renderer, &mut stats).unwrap();
        assert_eq!(renderer.calls.get(), calls);
        assert_eq!(stats.fast_path_hits, 1);
    }

    #[test]
    fn upper_levels_pass_through() {
        let (validator, mut tracker, mut store) = setup();
        let renderer = Fill::default();
        let mut stats = CacheStats::default();
        tracker.mark_all();

        validator
            .fetch(TileCoord::new(0, 0, 1), &mut tracker, &mut store, &renderer, &mut stats)
            .unwrap();
        assert_eq!(renderer.calls.get(), 0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn failure_keeps_area_dirty() {
        let (validator, mut tracker, mut store) = setup();
        let bad = IRect::new(0, 0, 4, 4);
        let renderer = Fill {
            fail_on: Some(bad),
            ..Fill::default()
        };
        let mut stats = CacheStats::default();
        tracker.mark_dirty(bad);

        let err = validator
            .fetch(TileCoord::base(0, 0), &mut tracker, &mut store, &renderer, &mut stats)
            .unwrap_err();
        assert!(matches!(err, CacheError::Render(_)));
        assert!(tracker.region().contains_rect(bad));
        assert_eq!(stats.render_failures, 1);
        assert_eq!(stats.revalidated_tiles, 0);
    }

    #[test]
    fn undersized_tile_is_reported() {
        let (validator, mut tracker, _) = setup();
        let mut store = MemoryTileStore::new(TileGrid::new(4, 4), 1);
        let renderer = Fill::default();
        let mut stats = CacheStats::default();
        tracker.mark_dirty(IRect::new(6, 6, 2, 2));

        let err = validator
            .fetch(TileCoord::base(0, 0), &mut tracker, &mut store, &renderer, &mut stats)
            .unwrap_err();
        assert!(matches!(err, CacheError::TileBufferTooSmall { .. }));
        assert_eq!(renderer.calls.get(), 0);
        assert!(tracker.is_dirty_in(IRect::new(6, 6, 2, 2)));
    }

    #[test]
    fn narrow_tile_is_rejected_even_when_the_rect_fits() {
        let (validator, mut tracker, _) = setup();
        // 4-pixel stride under an 8-pixel grid: byte 6 of row 0 would be
        // pixel (2, 1) of the tile.
        let mut store = MemoryTileStore::new(TileGrid::new(4, 4), 1);
        let renderer = Fill::default();
        let mut stats = CacheStats::default();
        let stale = IRect::new(6, 0, 2, 1);
        tracker.mark_dirty(stale);

        let err = validator
            .fetch(TileCoord::base(0, 0), &mut tracker, &mut store, &renderer, &mut stats)
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::TileBufferTooSmall {
                len: 16,
                required: 64,
                ..
            }
        ));
        assert_eq!(renderer.calls.get(), 0);
        assert!(tracker.region().contains_rect(stale));
        let tile = store.get(TileCoord::base(0, 0)).unwrap();
        assert!(tile.lock_for_read().iter().all(|&b| b == 0));
    }
}
