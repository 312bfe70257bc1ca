// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pyramid invalidation: voiding coarse tiles above a dirtied base area.
//!
//! Base-level staleness is tracked lazily by the
//! [`DirtyTracker`](crate::DirtyTracker). Levels `1..=max_level` have no such
//! mechanism; whoever builds them regenerates a tile wholesale once it has
//! been voided. So when a base area changes, every coarser tile whose
//! footprint covers part of it must be voided eagerly.

use crate::rect::IRect;
use crate::store::TileStore;
use crate::tile::{TileCoord, TileGrid};

/// Highest pyramid level for a `width × height` base level on `grid`.
///
/// With `n` the larger of the column and row counts plus one, this is
/// `floor(log2(n))`. Any non-positive dimension yields 0.
///
/// ```
/// use understory_projection::{TileGrid, max_level_for};
///
/// let grid = TileGrid::new(256, 256);
/// assert_eq!(max_level_for(512, 512, grid), 1);
/// assert_eq!(max_level_for(4096, 1024, grid), 4);
/// assert_eq!(max_level_for(0, 512, grid), 0);
/// ```
#[must_use]
pub fn max_level_for(width: i32, height: i32, grid: TileGrid) -> u32 {
    if width <= 0 || height <= 0 || !grid.is_valid() {
        return 0;
    }
    let cols = TileGrid::tiles_along(width, grid.tile_width);
    let rows = TileGrid::tiles_along(height, grid.tile_height);
    let n = cols.max(rows).saturating_add(1);
    n.ilog2()
}

/// Voids the pyramid tiles affected by base-level changes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PyramidInvalidator {
    grid: TileGrid,
    max_level: u32,
}

impl PyramidInvalidator {
    /// Creates an invalidator with no levels above the base.
    #[must_use]
    pub fn new(grid: TileGrid) -> Self {
        Self { grid, max_level: 0 }
    }

    /// Returns the tile grid.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    /// Replaces the tile grid. Call [`recompute_max_level`](Self::recompute_max_level)
    /// before the next invalidation.
    pub fn set_grid(&mut self, grid: TileGrid) {
        self.grid = grid;
    }

    /// Returns the highest pyramid level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Recomputes [`max_level`](Self::max_level) for a base level of the given size.
    pub fn recompute_max_level(&mut self, proj_width: i32, proj_height: i32) {
        self.max_level = max_level_for(proj_width, proj_height, self.grid);
    }

    /// Voids `coord` and each of its ancestors up to `max_level`.
    ///
    /// A coordinate already at or above `max_level` voids only itself.
    /// Returns the number of tiles voided.
    pub fn void_pyramid<S: TileStore + ?Sized>(&self, coord: TileCoord, store: &mut S) -> u64 {
        let mut coord = coord;
        let mut voided = 1;
        store.void(coord);
        tracing::trace!(?coord, "voided pyramid tile");
        while coord.level < self.max_level {
            coord = coord.parent();
            store.void(coord);
            tracing::trace!(?coord, "voided pyramid tile");
            voided += 1;
        }
        voided
    }

    /// Voids every tile on levels `1..=max_level` that covers part of `rect`.
    ///
    /// `rect` is in base-level coordinates and should already be clipped to
    /// the base bounds. Level 0 is never voided. Each affected tile is voided
    /// once even when several base tiles share it as an ancestor. Returns the
    /// number of tiles voided.
    pub fn invalidate_pyramid<S: TileStore + ?Sized>(&self, rect: IRect, store: &mut S) -> u64 {
        if self.max_level == 0 {
            return 0;
        }
        let Some((cols, rows)) = self.grid.tile_range(rect) else {
            return 0;
        };
        let mut voided = 0;
        for level in 1..=self.max_level {
            // Ancestors of a contiguous base range form a contiguous range.
            let col_span = (cols.start() >> level)..=(cols.end() >> level);
            let row_span = (rows.start() >> level)..=(rows.end() >> level);
            for row in row_span {
                for col in col_span.clone() {
                    let coord = TileCoord::new(col, row, level);
                    store.void(coord);
                    tracing::trace!(?coord, "voided pyramid tile");
                    voided += 1;
                }
            }
        }
        voided
    }
}
