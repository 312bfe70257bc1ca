// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile coordinates and grid geometry.

use core::ops::RangeInclusive;

use crate::rect::IRect;

/// Address of a tile in the pyramid.
///
/// Level 0 is the base resolution; level `k` is conceptually the base image
/// downsampled by `2^k` on both axes. `col` and `row` are counted in tiles
/// within the tile's own level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Tile column.
    pub col: i32,
    /// Tile row.
    pub row: i32,
    /// Pyramid level, 0 being the base.
    pub level: u32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    #[must_use]
    pub const fn new(col: i32, row: i32, level: u32) -> Self {
        Self { col, row, level }
    }

    /// Creates a base-level tile coordinate.
    #[must_use]
    pub const fn base(col: i32, row: i32) -> Self {
        Self::new(col, row, 0)
    }

    /// Returns the tile one level up that covers this one.
    #[must_use]
    pub const fn parent(&self) -> Self {
        Self::new(self.col / 2, self.row / 2, self.level + 1)
    }
}

/// Tile size shared by every level of the pyramid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileGrid {
    /// Tile width in pixels.
    pub tile_width: i32,
    /// Tile height in pixels.
    pub tile_height: i32,
}

impl TileGrid {
    /// Creates a grid; both dimensions should be positive.
    #[must_use]
    pub const fn new(tile_width: i32, tile_height: i32) -> Self {
        Self {
            tile_width,
            tile_height,
        }
    }

    /// Returns `true` if both tile dimensions are positive.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.tile_width > 0 && self.tile_height > 0
    }

    /// Pixel footprint of tile `(col, row)` in its own level's coordinates.
    #[must_use]
    pub fn footprint(&self, col: i32, row: i32) -> IRect {
        IRect::new(
            col.saturating_mul(self.tile_width),
            row.saturating_mul(self.tile_height),
            self.tile_width,
            self.tile_height,
        )
    }

    /// Inclusive column and row ranges of the tiles overlapping `rect`.
    ///
    /// Returns `None` for an empty `rect` or an invalid grid. `rect` must lie
    /// in non-negative coordinates.
    #[must_use]
    pub fn tile_range(&self, rect: IRect) -> Option<(RangeInclusive<i32>, RangeInclusive<i32>)> {
        if rect.is_empty() || !self.is_valid() {
            return None;
        }
        debug_assert!(rect.x >= 0 && rect.y >= 0, "tile ranges need clipped rects");
        let cols = rect.x / self.tile_width..=(rect.x1() - 1) / self.tile_width;
        let rows = rect.y / self.tile_height..=(rect.y1() - 1) / self.tile_height;
        Some((cols, rows))
    }

    /// Number of tiles needed to cover `len` pixels with tiles of `tile` pixels.
    pub(crate) fn tiles_along(len: i32, tile: i32) -> i32 {
        if len <= 0 {
            0
        } else {
            (len - 1) / tile + 1
        }
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(256, 256)
    }
}
