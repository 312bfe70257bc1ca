// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory tile store backed by a hash map. Small and simple; good for
//! tests and embedders without their own tile backend.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt::Debug;

use hashbrown::HashMap;

use crate::store::{Tile, TileStore};
use crate::tile::{TileCoord, TileGrid};

/// A tile held by a [`MemoryTileStore`].
///
/// Handles are cheap to clone and share the same pixels. Locks are
/// `RefCell` borrows: taking a write lock while any other lock on the same
/// tile is alive panics.
#[derive(Clone)]
pub struct MemoryTile {
    inner: Rc<TileBuffer>,
}

struct TileBuffer {
    pixels: RefCell<Vec<u8>>,
    stride: usize,
    bytes_per_pixel: usize,
}

impl MemoryTile {
    fn new(grid: TileGrid, bytes_per_pixel: usize) -> Self {
        let width = usize::try_from(grid.tile_width).unwrap_or(0);
        let height = usize::try_from(grid.tile_height).unwrap_or(0);
        let stride = width * bytes_per_pixel;
        Self {
            inner: Rc::new(TileBuffer {
                pixels: RefCell::new(vec![0; stride * height]),
                stride,
                bytes_per_pixel,
            }),
        }
    }

    /// Returns `true` if both handles refer to the same stored tile.
    #[must_use]
    pub fn same_tile(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Debug for MemoryTile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryTile")
            .field("stride", &self.inner.stride)
            .field("bytes_per_pixel", &self.inner.bytes_per_pixel)
            .finish_non_exhaustive()
    }
}

impl Tile for MemoryTile {
    type WriteGuard<'a> = RefMut<'a, [u8]>;
    type ReadGuard<'a> = Ref<'a, [u8]>;

    fn lock_for_write(&self) -> Self::WriteGuard<'_> {
        RefMut::map(self.inner.pixels.borrow_mut(), Vec::as_mut_slice)
    }

    fn lock_for_read(&self) -> Self::ReadGuard<'_> {
        Ref::map(self.inner.pixels.borrow(), Vec::as_slice)
    }

    fn stride(&self) -> usize {
        self.inner.stride
    }

    fn bytes_per_pixel(&self) -> usize {
        self.inner.bytes_per_pixel
    }
}

/// Hash-map tile store allocating zeroed, tightly packed tiles on demand.
///
/// Every level uses the same tile size. Voiding a tile removes it from the
/// map; handles still held elsewhere keep their pixels but are detached from
/// the store.
pub struct MemoryTileStore {
    tiles: HashMap<TileCoord, MemoryTile>,
    grid: TileGrid,
    bytes_per_pixel: usize,
}

impl MemoryTileStore {
    /// Creates an empty store for tiles of `grid` size.
    #[must_use]
    pub fn new(grid: TileGrid, bytes_per_pixel: usize) -> Self {
        Self {
            tiles: HashMap::new(),
            grid,
            bytes_per_pixel,
        }
    }

    /// Tile size of newly created tiles.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    /// Changes the size of tiles created from now on and drops every stored
    /// tile.
    pub fn set_grid(&mut self, grid: TileGrid) {
        self.grid = grid;
        self.tiles.clear();
    }

    /// Returns the stored tile at `coord` without creating it.
    #[must_use]
    pub fn get(&self, coord: TileCoord) -> Option<&MemoryTile> {
        self.tiles.get(&coord)
    }

    /// Returns `true` if a tile is stored at `coord`.
    #[must_use]
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Number of stored tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns `true` if no tiles are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Drops every stored tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

impl Debug for MemoryTileStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryTileStore")
            .field("tiles", &self.tiles.len())
            .field("grid", &self.grid)
            .field("bytes_per_pixel", &self.bytes_per_pixel)
            .finish()
    }
}

impl TileStore for MemoryTileStore {
    type Tile = MemoryTile;

    fn get_or_create(&mut self, coord: TileCoord) -> MemoryTile {
        let (grid, bpp) = (self.grid, self.bytes_per_pixel);
        self.tiles
            .entry(coord)
            .or_insert_with(|| MemoryTile::new(grid, bpp))
            .clone()
    }

    fn void(&mut self, coord: TileCoord) {
        self.tiles.remove(&coord);
    }
}
