// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the projection cache.

use crate::render::RenderError;
use crate::tile::TileCoord;

/// Error returned by [`ProjectionCache`](crate::ProjectionCache) operations.
///
/// Every variant leaves the cache usable. Areas that could not be
/// revalidated stay dirty, so a later fetch retries them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The cache was used before [`configure`](crate::ProjectionCache::configure).
    #[error("projection cache used before it was configured")]
    NotConfigured,
    /// A tile dimension was zero or negative.
    #[error("invalid tile size {width}x{height}, both dimensions must be positive")]
    InvalidTileSize {
        /// Requested tile width.
        width: i32,
        /// Requested tile height.
        height: i32,
    },
    /// The renderer failed for one of the stale rectangles.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The store returned a tile whose buffer cannot hold the tile footprint.
    #[error("tile {coord:?} buffer holds {len} bytes but {required} are needed")]
    TileBufferTooSmall {
        /// The tile being revalidated.
        coord: TileCoord,
        /// Actual buffer length.
        len: usize,
        /// Bytes needed for the area being written.
        required: usize,
    },
}
