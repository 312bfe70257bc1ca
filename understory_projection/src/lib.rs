// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Projection: a tile cache for rendered projections.
//!
//! A projection is a rendered raster view of some upstream content, cut into
//! fixed-size tiles and arranged as a pyramid of successively coarser levels.
//! This crate keeps such a tile cache coherent with upstream changes without
//! rendering anything eagerly. It is built from:
//!
//! - **Rectangles and regions** ([`IRect`], [`RegionSet`]): Integer pixel
//!   rectangles and sets of disjoint rectangles with union, subtract and
//!   intersect.
//! - **Dirty tracking** ([`DirtyTracker`]): The stale part of the base level,
//!   clipped to the projection bounds and versioned with a generation counter.
//! - **Pyramid invalidation** ([`PyramidInvalidator`]): Eagerly voids every
//!   coarser tile above a changed base area.
//! - **Read-path validation** ([`TileValidator`]): Renders only the stale
//!   rectangles of a base tile right before it is handed out.
//! - **The cache** ([`ProjectionCache`]): Ties the above to a [`Renderer`] and
//!   a [`TileStore`].
//! - **Deferred updates** ([`UpdateQueue`]): Collects update areas in image
//!   coordinates and feeds them to the cache at once or in idle chunks.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_projection::{
//!     IRect, MemoryTileStore, PixelLayout, ProjectionCache, RenderError, RenderFn, TileCoord,
//!     TileGrid, TileStore,
//! };
//!
//! // Paints every requested pixel with the same byte.
//! let renderer = RenderFn(|rect: IRect, dest: &mut [u8], layout: PixelLayout| {
//!     for row in 0..rect.height as usize {
//!         let start = row * layout.stride;
//!         dest[start..start + rect.width as usize * layout.bytes_per_pixel].fill(0x7f);
//!     }
//!     Ok::<(), RenderError>(())
//! });
//!
//! let mut store = MemoryTileStore::new(TileGrid::new(256, 256), 4);
//! // A coarse tile that some earlier pass produced.
//! store.get_or_create(TileCoord::new(0, 0, 1));
//!
//! let mut cache = ProjectionCache::new(renderer, store);
//! cache.configure(512, 512, 256, 256).unwrap();
//!
//! // Upstream changed a small area: the base stays lazily dirty, the pyramid
//! // tile above it is gone.
//! cache.invalidate(0, 0, 10, 10).unwrap();
//! assert!(cache.dirty().region().contains_rect(IRect::new(0, 0, 10, 10)));
//! assert!(!cache.store().contains(TileCoord::new(0, 0, 1)));
//!
//! // Reading the base tile renders exactly the stale part.
//! cache.fetch(0, 0, 0).unwrap();
//! assert!(cache.dirty().is_clean());
//! ```
//!
//! ## Laziness
//!
//! Base-level tiles are only rendered when fetched, and then only where
//! stale. Coarser tiles are never rendered by this crate: they are voided in
//! the store and whoever builds them regenerates them on their next fetch.
//! A fetch of a coarser tile therefore returns whatever the store holds.
//!
//! ## Stores and Renderers
//!
//! [`TileStore`] and [`Tile`] describe pixel storage; [`MemoryTileStore`] is a
//! simple in-memory implementation. [`Renderer`] produces pixels for a
//! rectangle of the base level; [`RenderFn`] adapts a closure.
//!
//! ## Logging
//!
//! Voids, revalidations and render failures are reported through
//! [`tracing`] at `trace`, `debug` and `warn` level respectively.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod cache;
mod config;
mod error;
mod pyramid;
mod rect;
mod region;
mod render;
mod stats;
mod store;
pub mod stores;
mod tile;
mod tracker;
mod update;
mod validate;

pub use cache::{ProjectionCache, estimate_memsize};
pub use config::ProjectionConfig;
pub use error::CacheError;
pub use pyramid::{PyramidInvalidator, max_level_for};
pub use rect::IRect;
pub use region::{Rectangles, RegionSet};
pub use render::{PixelLayout, RenderError, RenderFn, Renderer};
pub use stats::CacheStats;
pub use store::{Tile, TileStore};
pub use stores::memory::{MemoryTile, MemoryTileStore};
pub use tile::{TileCoord, TileGrid};
pub use tracker::DirtyTracker;
pub use update::{CHUNK_HEIGHT, CHUNK_WIDTH, UpdateKind, UpdateObserver, UpdateQueue};
pub use validate::TileValidator;
