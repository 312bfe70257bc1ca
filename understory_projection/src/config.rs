// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projection geometry.

use crate::rect::IRect;
use crate::tile::TileGrid;

/// Size, tiling and placement of a projection.
///
/// `width`, `height`, `tile_width` and `tile_height` form one consistency
/// group: the cache derives its pyramid depth from all four and recomputes
/// it whenever a new config is applied. The offset places the projection
/// inside image coordinates and only affects [`UpdateQueue`](crate::UpdateQueue).
///
/// ```
/// use understory_projection::ProjectionConfig;
///
/// let config = ProjectionConfig::new(1920, 1080)
///     .with_tile_size(128, 128)
///     .with_offset(-10, 20);
/// assert_eq!(config.grid().tile_width, 128);
/// assert_eq!(config.bounds().width, 1920);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProjectionConfig {
    /// Base-level width in pixels.
    pub width: i32,
    /// Base-level height in pixels.
    pub height: i32,
    /// Tile width in pixels; must be positive.
    pub tile_width: i32,
    /// Tile height in pixels; must be positive.
    pub tile_height: i32,
    /// Horizontal position of the projection in image coordinates.
    pub offset_x: i32,
    /// Vertical position of the projection in image coordinates.
    pub offset_y: i32,
}

impl ProjectionConfig {
    /// Default tile edge length.
    pub const DEFAULT_TILE_SIZE: i32 = 256;

    /// A `width × height` projection with default tiles and no offset.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            tile_width: Self::DEFAULT_TILE_SIZE,
            tile_height: Self::DEFAULT_TILE_SIZE,
            offset_x: 0,
            offset_y: 0,
        }
    }

    /// Returns the config with a different tile size.
    #[must_use]
    pub const fn with_tile_size(mut self, tile_width: i32, tile_height: i32) -> Self {
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        self
    }

    /// Returns the config with a different image offset.
    #[must_use]
    pub const fn with_offset(mut self, offset_x: i32, offset_y: i32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// Tile grid of the config.
    #[must_use]
    pub const fn grid(&self) -> TileGrid {
        TileGrid::new(self.tile_width, self.tile_height)
    }

    /// Base-level bounds in projection coordinates.
    #[must_use]
    pub const fn bounds(&self) -> IRect {
        IRect::new(0, 0, self.width, self.height)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
