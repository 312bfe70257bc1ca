// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The projection cache façade.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashSet;

use crate::config::ProjectionConfig;
use crate::error::CacheError;
use crate::pyramid::PyramidInvalidator;
use crate::rect::IRect;
use crate::render::{PixelLayout, Renderer};
use crate::stats::CacheStats;
use crate::store::{Tile, TileStore};
use crate::tile::{TileCoord, TileGrid};
use crate::tracker::DirtyTracker;
use crate::validate::TileValidator;

/// Tile cache in front of a [`Renderer`], backed by a [`TileStore`].
///
/// Writers call [`invalidate`](Self::invalidate) when the pixels of an area
/// change upstream. The area is recorded as dirty at the base level and the
/// coarser pyramid tiles above it are voided at once. Readers call
/// [`fetch`](Self::fetch); base-level tiles are re-rendered where stale
/// before they are returned, so a fetched base tile is always current.
///
/// The cache holds no pixels. Its only state is the dirty region, the
/// geometry and some counters. All mutation goes through `&mut self`, which
/// serialises invalidations and fetches on one cache.
///
/// # Example
///
/// ```
/// use understory_projection::{
///     IRect, MemoryTileStore, PixelLayout, ProjectionCache, RenderError, RenderFn, Tile,
///     TileCoord, TileGrid,
/// };
///
/// let renderer = RenderFn(|rect: IRect, dest: &mut [u8], layout: PixelLayout| {
///     for row in 0..rect.height as usize {
///         let start = row * layout.stride;
///         dest[start..start + rect.width as usize * layout.bytes_per_pixel].fill(1);
///     }
///     Ok::<(), RenderError>(())
/// });
/// let store = MemoryTileStore::new(TileGrid::new(256, 256), 4);
///
/// let mut cache = ProjectionCache::new(renderer, store);
/// cache.configure(512, 512, 256, 256).unwrap();
/// assert_eq!(cache.max_level(), 1);
///
/// cache.invalidate(0, 0, 10, 10).unwrap();
/// let tile = cache.fetch(0, 0, 0).unwrap();
/// assert_eq!(tile.lock_for_read()[0], 1);
/// assert!(cache.dirty().is_clean());
/// ```
pub struct ProjectionCache<R, S> {
    renderer: R,
    store: S,
    config: ProjectionConfig,
    configured: bool,
    tracker: DirtyTracker,
    pyramid: PyramidInvalidator,
    validator: TileValidator,
    stats: CacheStats,
}

impl<R, S> ProjectionCache<R, S>
where
    R: Renderer,
    S: TileStore,
{
    /// Creates an unconfigured cache bound to `renderer` and `store`.
    ///
    /// Pass references (`&renderer`, `&mut store`) to keep ownership with
    /// the caller.
    pub fn new(renderer: R, store: S) -> Self {
        let config = ProjectionConfig::default();
        Self {
            renderer,
            store,
            config,
            configured: false,
            tracker: DirtyTracker::new(0, 0),
            pyramid: PyramidInvalidator::new(config.grid()),
            validator: TileValidator::new(config.grid()),
            stats: CacheStats::default(),
        }
    }

    /// Sets the projection size and tile size, keeping the current offset.
    ///
    /// See [`configure_with`](Self::configure_with).
    pub fn configure(
        &mut self,
        proj_width: i32,
        proj_height: i32,
        tile_width: i32,
        tile_height: i32,
    ) -> Result<(), CacheError> {
        self.configure_with(ProjectionConfig {
            width: proj_width,
            height: proj_height,
            tile_width,
            tile_height,
            ..self.config
        })
    }

    /// Applies `config` and recomputes the pyramid depth.
    ///
    /// Dirtiness is kept across reconfiguration, clipped to the new bounds.
    /// Pyramid tiles voided earlier are not revisited. Fails without changing
    /// anything if a tile dimension is not positive.
    ///
    /// Changing the tile size of a configured cache marks the whole
    /// projection dirty and voids the pyramid, since stored tiles were cut
    /// for the old footprints.
    pub fn configure_with(&mut self, config: ProjectionConfig) -> Result<(), CacheError> {
        let grid = config.grid();
        if !grid.is_valid() {
            return Err(CacheError::InvalidTileSize {
                width: config.tile_width,
                height: config.tile_height,
            });
        }
        let regridded = self.configured && grid != self.config.grid();
        self.config = config;
        self.configured = true;
        self.tracker.set_bounds(config.width, config.height);
        self.pyramid.set_grid(grid);
        self.pyramid.recompute_max_level(config.width, config.height);
        self.validator.set_grid(grid);
        if regridded {
            self.invalidate_rect(config.bounds())?;
        }
        tracing::debug!(
            width = config.width,
            height = config.height,
            tile_width = config.tile_width,
            tile_height = config.tile_height,
            max_level = self.pyramid.max_level(),
            "configured projection cache"
        );
        Ok(())
    }

    /// Moves the projection inside image coordinates.
    pub fn set_offset(&mut self, offset_x: i32, offset_y: i32) {
        self.config.offset_x = offset_x;
        self.config.offset_y = offset_y;
    }

    /// Returns the current geometry.
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Returns `true` once [`configure`](Self::configure) has succeeded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Returns the tile grid.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        self.config.grid()
    }

    /// Highest pyramid level above the base.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.pyramid.max_level()
    }

    /// Read-only view of the dirty region.
    #[must_use]
    pub fn dirty(&self) -> &DirtyTracker {
        &self.tracker
    }

    /// Activity counters since creation or the last [`reset_stats`](Self::reset_stats).
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Zeroes the activity counters.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Returns the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Returns the tile store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the tile store mutably.
    ///
    /// Writing base-level tiles behind the cache's back is not tracked.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the cache and returns the renderer and store.
    pub fn into_parts(self) -> (R, S) {
        (self.renderer, self.store)
    }

    /// Marks `(x, y, width, height)` stale and voids the pyramid tiles above it.
    ///
    /// The rectangle is in base-level coordinates and is clipped to the
    /// projection bounds first.
    pub fn invalidate(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), CacheError> {
        self.invalidate_rect(IRect::new(x, y, width, height))
    }

    /// Rectangle form of [`invalidate`](Self::invalidate).
    pub fn invalidate_rect(&mut self, rect: IRect) -> Result<(), CacheError> {
        self.ensure_configured()?;
        let clipped = self.tracker.mark_dirty(rect);
        if clipped.is_empty() {
            return Ok(());
        }
        let voided = self.pyramid.invalidate_pyramid(clipped, &mut self.store);
        self.stats.voided_tiles = self.stats.voided_tiles.wrapping_add(voided);
        Ok(())
    }

    /// Invalidates the whole projection.
    pub fn invalidate_all(&mut self) -> Result<(), CacheError> {
        self.invalidate_rect(self.config.bounds())
    }

    /// Returns tile `(col, row, level)`, validated if it is a base tile.
    ///
    /// Tiles above the base are returned as the store has them.
    pub fn fetch(&mut self, col: i32, row: i32, level: u32) -> Result<S::Tile, CacheError> {
        self.fetch_tile(TileCoord::new(col, row, level))
    }

    /// Coordinate form of [`fetch`](Self::fetch).
    pub fn fetch_tile(&mut self, coord: TileCoord) -> Result<S::Tile, CacheError> {
        self.ensure_configured()?;
        self.validator.fetch(
            coord,
            &mut self.tracker,
            &mut self.store,
            &self.renderer,
            &mut self.stats,
        )
    }

    /// Base-level tiles that overlap the dirty region, in row-major order.
    #[must_use]
    pub fn dirty_tiles(&self) -> Vec<TileCoord> {
        let grid = self.grid();
        let mut seen = HashSet::new();
        for rect in self.tracker.region().rectangles() {
            let Some((cols, rows)) = grid.tile_range(rect) else {
                continue;
            };
            for row in rows {
                for col in cols.clone() {
                    seen.insert(TileCoord::base(col, row));
                }
            }
        }
        let mut tiles: Vec<_> = seen.into_iter().collect();
        tiles.sort_unstable_by_key(|c| (c.row, c.col));
        tiles
    }

    /// Fetches every dirty base tile, leaving the dirty region empty.
    ///
    /// Returns the number of tiles revalidated. Stops at the first error;
    /// tiles not reached stay dirty.
    pub fn validate_all(&mut self) -> Result<usize, CacheError> {
        self.ensure_configured()?;
        let tiles = self.dirty_tiles();
        for coord in &tiles {
            self.fetch_tile(*coord)?;
        }
        Ok(tiles.len())
    }

    /// Copies the base-level pixel at `(x, y)` into `out`.
    ///
    /// Copies at most one pixel's worth of bytes. Returns `Ok(false)` if the
    /// pixel lies outside the projection.
    pub fn pixel_at(&mut self, x: i32, y: i32, out: &mut [u8]) -> Result<bool, CacheError> {
        self.ensure_configured()?;
        if !self.config.bounds().contains_point(x, y) {
            return Ok(false);
        }
        let grid = self.grid();
        let coord = TileCoord::base(x / grid.tile_width, y / grid.tile_height);
        let tile = self.fetch_tile(coord)?;

        let layout = PixelLayout::new(tile.stride(), tile.bytes_per_pixel());
        let offset = layout.offset(
            (x - coord.col * grid.tile_width) as usize,
            (y - coord.row * grid.tile_height) as usize,
        );
        let len = layout.bytes_per_pixel.min(out.len());
        let pixels = tile.lock_for_read();
        let Some(src) = pixels.get(offset..offset + len) else {
            return Err(CacheError::TileBufferTooSmall {
                coord,
                len: pixels.len(),
                required: offset + len,
            });
        };
        out[..len].copy_from_slice(src);
        Ok(true)
    }

    fn ensure_configured(&self) -> Result<(), CacheError> {
        if self.configured {
            Ok(())
        } else {
            Err(CacheError::NotConfigured)
        }
    }
}

impl<R, S> Debug for ProjectionCache<R, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProjectionCache")
            .field("config", &self.config)
            .field("configured", &self.configured)
            .field("max_level", &self.pyramid.max_level())
            .field("dirty_area", &self.tracker.region().area())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Rough memory needed to hold a `width × height` projection with its pyramid.
///
/// The pyramid levels form a geometric series with ratio 1/4, so the total
/// is about 4/3 of the base level.
///
/// ```
/// use understory_projection::estimate_memsize;
///
/// assert_eq!(estimate_memsize(4, 300, 300), 480_000);
/// ```
#[must_use]
pub fn estimate_memsize(bytes_per_pixel: usize, width: i32, height: i32) -> u64 {
    let base = (bytes_per_pixel as u64)
        .saturating_mul(width.max(0) as u64)
        .saturating_mul(height.max(0) as u64);
    base.saturating_add(base / 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use crate::stores::memory::MemoryTileStore;

    struct Gradient;

    impl Renderer for Gradient {
        fn render(&self, rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError> {
            for row in 0..rect.height as usize {
                for col in 0..rect.width as usize {
                    let at = layout.offset(col, row);
                    dest[at] = (rect.x as usize + col) as u8;
                    dest[at + 1] = (rect.y as usize + row) as u8;
                }
            }
            Ok(())
        }
    }

    fn cache() -> ProjectionCache<Gradient, MemoryTileStore> {
        let grid = TileGrid::new(16, 16);
        let mut cache = ProjectionCache::new(Gradient, MemoryTileStore::new(grid, 2));
        cache.configure(64, 48, 16, 16).unwrap();
        cache
    }

    #[test]
    fn unconfigured_cache_refuses_work() {
        let mut cache = ProjectionCache::new(Gradient, MemoryTileStore::new(TileGrid::default(), 4));
        assert_eq!(cache.invalidate(0, 0, 1, 1), Err(CacheError::NotConfigured));
        assert!(matches!(cache.fetch(0, 0, 0), Err(CacheError::NotConfigured)));
        assert!(!cache.is_configured());
    }

    #[test]
    fn invalid_tile_size_keeps_previous_config() {
        let mut cache = cache();
        let before = *cache.config();
        assert_eq!(
            cache.configure(64, 64, 0, 16),
            Err(CacheError::InvalidTileSize {
                width: 0,
                height: 16
            })
        );
        assert_eq!(*cache.config(), before);
        assert!(cache.is_configured());
    }

    #[test]
    fn reconfigure_keeps_dirty_in_bounds() {
        let mut cache = cache();
        cache.invalidate_all().unwrap();
        cache.configure(32, 32, 8, 8).unwrap();
        assert_eq!(cache.dirty().region().bounds(), IRect::new(0, 0, 32, 32));
        assert_eq!(cache.dirty_tiles().len(), 16);
    }

    #[test]
    fn changing_tile_size_dirties_everything() {
        let mut cache = cache();
        cache.store_mut().get_or_create(TileCoord::new(0, 0, 1));
        cache.configure(64, 48, 8, 8).unwrap();
        assert_eq!(cache.dirty().region().area(), 64 * 48);
        assert!(!cache.store().contains(TileCoord::new(0, 0, 1)));

        cache.validate_all().unwrap();
        cache.configure(32, 48, 8, 8).unwrap();
        assert!(cache.dirty().is_clean());
    }

    #[test]
    fn dirty_tiles_are_row_major_and_unique() {
        let mut cache = cache();
        cache.invalidate(10, 10, 10, 10).unwrap();
        cache.invalidate(12, 12, 30, 2).unwrap();
        assert_eq!(
            cache.dirty_tiles(),
            [
                TileCoord::base(0, 0),
                TileCoord::base(1, 0),
                TileCoord::base(2, 0),
                TileCoord::base(0, 1),
                TileCoord::base(1, 1),
            ]
        );
    }

    #[test]
    fn validate_all_cleans_everything() {
        let mut cache = cache();
        cache.invalidate_all().unwrap();
        assert_eq!(cache.validate_all().unwrap(), 12);
        assert!(cache.dirty().is_clean());
        assert_eq!(cache.validate_all().unwrap(), 0);
    }

    #[test]
    fn pixel_at_reads_rendered_value() {
        let mut cache = cache();
        cache.invalidate_all().unwrap();
        let mut px = [0_u8; 2];
        assert!(cache.pixel_at(37, 21, &mut px).unwrap());
        assert_eq!(px, [37, 21]);
        assert!(!cache.pixel_at(64, 0, &mut px).unwrap());
        assert!(!cache.pixel_at(-1, 0, &mut px).unwrap());
    }

    #[test]
    fn memsize_includes_pyramid() {
        assert_eq!(estimate_memsize(1, 3, 1), 4);
        assert_eq!(estimate_memsize(4, 0, 100), 0);
        assert_eq!(estimate_memsize(4, -5, 100), 0);
        assert_eq!(estimate_memsize(8, i32::MAX, i32::MAX), u64::MAX);
    }
}
