// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile storage abstraction.

use core::ops::{Deref, DerefMut};

use crate::tile::TileCoord;

/// A handle to one stored tile's pixel buffer.
///
/// The buffer is `stride * tile_height` bytes (or more), rows laid out top to
/// bottom with `bytes_per_pixel` bytes per pixel. Guards returned by the lock
/// methods release their access when dropped.
pub trait Tile {
    /// Exclusive access to the pixel bytes.
    type WriteGuard<'a>: DerefMut<Target = [u8]>
    where
        Self: 'a;

    /// Shared access to the pixel bytes.
    type ReadGuard<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    /// Locks the buffer for writing until the guard is dropped.
    fn lock_for_write(&self) -> Self::WriteGuard<'_>;

    /// Locks the buffer for reading until the guard is dropped.
    fn lock_for_read(&self) -> Self::ReadGuard<'_>;

    /// Bytes between the starts of two consecutive rows.
    fn stride(&self) -> usize;

    /// Bytes per pixel of the tile's pixel format.
    fn bytes_per_pixel(&self) -> usize;
}

/// Storage of tiles keyed by [`TileCoord`].
///
/// The store owns allocation and eviction. The projection cache only asks it
/// for tiles and tells it when a tile's content is void.
pub trait TileStore {
    /// Handle type returned for stored tiles.
    type Tile: Tile;

    /// Returns the tile at `coord`, allocating an empty one if absent.
    fn get_or_create(&mut self, coord: TileCoord) -> Self::Tile;

    /// Drops any cached content at `coord`, so the next
    /// [`get_or_create`](Self::get_or_create) starts from scratch.
    fn void(&mut self, coord: TileCoord);
}

impl<S: TileStore + ?Sized> TileStore for &mut S {
    type Tile = S::Tile;

    fn get_or_create(&mut self, coord: TileCoord) -> Self::Tile {
        (**self).get_or_create(coord)
    }

    fn void(&mut self, coord: TileCoord) {
        (**self).void(coord);
    }
}
