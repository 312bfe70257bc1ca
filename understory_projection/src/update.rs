// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred update areas and chunked idle invalidation.
//!
//! Upstream changes usually arrive as many small areas in image coordinates,
//! long before anyone needs the pixels. An [`UpdateQueue`] collects them and
//! hands them to a [`ProjectionCache`] later, either all at once with
//! [`flush_now`](UpdateQueue::flush_now) or in small chunks with
//! [`flush`](UpdateQueue::flush) followed by repeated
//! [`render_step`](UpdateQueue::render_step) calls from an idle loop.
//!
//! Every painted area is reported to an [`UpdateObserver`] in image
//! coordinates, which is where a display would schedule a redraw.

use crate::cache::ProjectionCache;
use crate::error::CacheError;
use crate::rect::IRect;
use crate::region::RegionSet;
use crate::render::Renderer;
use crate::store::TileStore;

/// Maximum width of one idle chunk.
pub const CHUNK_WIDTH: i32 = 256;

/// Maximum height of one idle chunk.
pub const CHUNK_HEIGHT: i32 = 128;

/// How an update reached the cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Painted by [`UpdateQueue::flush_now`].
    Flush,
    /// Painted by [`UpdateQueue::render_step`].
    Idle,
}

/// Receives the areas painted by an [`UpdateQueue`].
///
/// Implemented for any `FnMut(UpdateKind, IRect)`.
pub trait UpdateObserver {
    /// Called after `area` (image coordinates) was invalidated on the cache.
    fn update(&mut self, kind: UpdateKind, area: IRect);
}

impl<F: FnMut(UpdateKind, IRect)> UpdateObserver for F {
    fn update(&mut self, kind: UpdateKind, area: IRect) {
        self(kind, area);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct IdleCursor {
    area: IRect,
    x: i32,
    y: i32,
}

impl IdleCursor {
    fn new(area: IRect) -> Self {
        Self {
            area,
            x: area.x,
            y: area.y,
        }
    }

    /// Rows of the area not yet finished.
    fn remainder(&self) -> IRect {
        IRect::from_extents(self.area.x, self.y, self.area.x1(), self.area.y1())
    }
}

/// Pending update areas plus the state of an in-progress idle render.
///
/// # Example
///
/// ```
/// use understory_projection::{
///     IRect, MemoryTileStore, PixelLayout, ProjectionCache, RenderError, RenderFn, TileGrid,
///     UpdateKind, UpdateQueue,
/// };
///
/// let renderer = RenderFn(|_: IRect, _: &mut [u8], _: PixelLayout| Ok::<(), RenderError>(()));
/// let mut cache = ProjectionCache::new(renderer, MemoryTileStore::new(TileGrid::default(), 4));
/// cache.configure(1024, 1024, 256, 256).unwrap();
///
/// let mut queue = UpdateQueue::new();
/// queue.add_update_area(&cache, 0, 0, 600, 200).unwrap();
/// queue.flush();
///
/// let mut painted = Vec::new();
/// queue.finish(&mut cache, &mut |kind: UpdateKind, area: IRect| painted.push((kind, area))).unwrap();
/// assert_eq!(painted.len(), 6);
/// assert!(queue.is_idle());
/// ```
#[derive(Clone, Debug, Default)]
pub struct UpdateQueue {
    pending: RegionSet,
    idle: RegionSet,
    current: Option<IdleCursor>,
}

impl UpdateQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Areas queued since the last flush, in projection coordinates.
    #[must_use]
    pub fn pending(&self) -> &RegionSet {
        &self.pending
    }

    /// Returns `true` if areas are waiting for a flush.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns `true` if no idle render is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Queues an area given in image coordinates.
    ///
    /// The area is moved into projection coordinates using the cache's offset
    /// and clamped to the projection; whatever remains is merged into the
    /// pending set.
    pub fn add_update_area<R, S>(
        &mut self,
        cache: &ProjectionCache<R, S>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), CacheError>
    where
        R: Renderer,
        S: TileStore,
    {
        if !cache.is_configured() {
            return Err(CacheError::NotConfigured);
        }
        let config = cache.config();
        let area = IRect::new(x, y, width, height)
            .translate(-config.offset_x, -config.offset_y)
            .clip_to_size(config.width, config.height);
        self.pending.union(area);
        Ok(())
    }

    /// Invalidates every pending area right away.
    pub fn flush_now<R, S, O>(
        &mut self,
        cache: &mut ProjectionCache<R, S>,
        observer: &mut O,
    ) -> Result<(), CacheError>
    where
        R: Renderer,
        S: TileStore,
        O: UpdateObserver + ?Sized,
    {
        for area in self.pending.rectangles() {
            paint_area(cache, observer, UpdateKind::Flush, area)?;
        }
        self.pending.clear();
        Ok(())
    }

    /// Hands the pending areas to the idle render.
    ///
    /// If an idle render is already running, the unfinished rows of its
    /// current area are merged back in and the render restarts from the
    /// merged set. Does nothing if no areas are pending.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(cursor) = self.current.take() {
            self.idle.union(cursor.remainder());
        }
        for area in self.pending.rectangles() {
            self.idle.union(area);
        }
        self.pending.clear();
        self.current = self.idle.pop().map(IdleCursor::new);
    }

    /// Invalidates the next chunk of the idle render.
    ///
    /// Chunks are at most [`CHUNK_WIDTH`] × [`CHUNK_HEIGHT`] pixels and walk
    /// each area left to right, then top to bottom. Returns whether idle
    /// work remains.
    pub fn render_step<R, S, O>(
        &mut self,
        cache: &mut ProjectionCache<R, S>,
        observer: &mut O,
    ) -> Result<bool, CacheError>
    where
        R: Renderer,
        S: TileStore,
        O: UpdateObserver + ?Sized,
    {
        let Some(cursor) = self.current.as_mut() else {
            return Ok(false);
        };
        let area = cursor.area;
        let chunk = IRect::from_extents(
            cursor.x,
            cursor.y,
            cursor.x.saturating_add(CHUNK_WIDTH).min(area.x1()),
            cursor.y.saturating_add(CHUNK_HEIGHT).min(area.y1()),
        );
        paint_area(cache, observer, UpdateKind::Idle, chunk)?;

        cursor.x = cursor.x.saturating_add(CHUNK_WIDTH);
        if cursor.x >= area.x1() {
            cursor.x = area.x;
            cursor.y = cursor.y.saturating_add(CHUNK_HEIGHT);
            if cursor.y >= area.y1() {
                self.current = self.idle.pop().map(IdleCursor::new);
            }
        }
        Ok(self.current.is_some())
    }

    /// Runs the idle render to completion.
    pub fn finish<R, S, O>(
        &mut self,
        cache: &mut ProjectionCache<R, S>,
        observer: &mut O,
    ) -> Result<(), CacheError>
    where
        R: Renderer,
        S: TileStore,
        O: UpdateObserver + ?Sized,
    {
        while self.render_step(cache, observer)? {}
        Ok(())
    }

    /// Drops all queued and in-progress work and queues the whole projection.
    ///
    /// Use this when the projection's structure changed so that nothing
    /// computed earlier can be trusted.
    pub fn restructure<R, S>(&mut self, cache: &ProjectionCache<R, S>)
    where
        R: Renderer,
        S: TileStore,
    {
        self.pending.clear();
        self.idle.clear();
        self.current = None;
        self.pending.union(cache.config().bounds());
    }
}

/// Invalidates `area` (projection coordinates) and reports it in image
/// coordinates.
fn paint_area<R, S, O>(
    cache: &mut ProjectionCache<R, S>,
    observer: &mut O,
    kind: UpdateKind,
    area: IRect,
) -> Result<(), CacheError>
where
    R: Renderer,
    S: TileStore,
    O: UpdateObserver + ?Sized,
{
    let config = *cache.config();
    // The projection may have shrunk since the area was queued.
    let area = area.clip_to_size(config.width, config.height);
    if area.is_empty() {
        return Ok(());
    }
    cache.invalidate_rect(area)?;
    observer.update(kind, area.translate(config.offset_x, config.offset_y));
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::render::{PixelLayout, RenderError};
    use crate::stores::memory::MemoryTileStore;
    use crate::tile::TileGrid;

    struct Nop;

    impl Renderer for Nop {
        fn render(&self, _: IRect, _: &mut [u8], _: PixelLayout) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn cache(width: i32, height: i32) -> ProjectionCache<Nop, MemoryTileStore> {
        let mut cache = ProjectionCache::new(Nop, MemoryTileStore::new(TileGrid::default(), 4));
        cache.configure(width, height, 256, 256).unwrap();
        cache
    }

    #[test]
    fn add_update_area_applies_offset_and_clamps() {
        let mut cache = cache(100, 100);
        cache.set_offset(50, 50);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 40, 40, 30, 30).unwrap();
        assert_eq!(queue.pending().bounds(), IRect::new(0, 0, 20, 20));

        queue.add_update_area(&cache, 0, 0, 10, 10).unwrap();
        assert_eq!(queue.pending().area(), 400);
    }

    #[test]
    fn flush_now_invalidates_and_reports_image_coordinates() {
        let mut cache = cache(100, 100);
        cache.set_offset(10, 0);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 20, 5, 10, 10).unwrap();

        let mut seen = Vec::new();
        queue
            .flush_now(&mut cache, &mut |kind: UpdateKind, area: IRect| {
                seen.push((kind, area));
            })
            .unwrap();

        assert_eq!(seen, [(UpdateKind::Flush, IRect::new(20, 5, 10, 10))]);
        assert!(cache.dirty().region().contains_rect(IRect::new(10, 5, 10, 10)));
        assert!(!queue.has_pending());
        assert!(queue.is_idle());
    }

    #[test]
    fn idle_render_walks_in_chunks() {
        let mut cache = cache(1000, 1000);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 0, 0, 300, 200).unwrap();
        queue.flush();
        assert!(!queue.is_idle());
        assert!(cache.dirty().is_clean());

        let mut chunks = Vec::new();
        let mut observer = |_: UpdateKind, area: IRect| chunks.push(area);
        assert!(queue.render_step(&mut cache, &mut observer).unwrap());
        assert!(queue.render_step(&mut cache, &mut observer).unwrap());
        assert!(queue.render_step(&mut cache, &mut observer).unwrap());
        assert!(!queue.render_step(&mut cache, &mut observer).unwrap());
        assert!(!queue.render_step(&mut cache, &mut observer).unwrap());

        assert_eq!(
            chunks,
            [
                IRect::new(0, 0, 256, 128),
                IRect::new(256, 0, 44, 128),
                IRect::new(0, 128, 256, 72),
                IRect::new(256, 128, 44, 72),
            ]
        );
        assert_eq!(cache.dirty().region().area(), 300 * 200);
    }

    #[test]
    fn flush_during_idle_render_keeps_unfinished_rows() {
        let mut cache = cache(1000, 1000);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 0, 0, 256, 256).unwrap();
        queue.flush();
        queue.render_step(&mut cache, &mut |_: UpdateKind, _: IRect| {}).unwrap();

        queue.add_update_area(&cache, 500, 500, 10, 10).unwrap();
        queue.flush();
        queue.finish(&mut cache, &mut |_: UpdateKind, _: IRect| {}).unwrap();

        let dirty = cache.dirty().region();
        assert!(dirty.contains_rect(IRect::new(0, 0, 256, 256)));
        assert!(dirty.contains_rect(IRect::new(500, 500, 10, 10)));
        assert!(queue.is_idle());
    }

    #[test]
    fn empty_flush_leaves_idle_render_in_place() {
        let mut cache = cache(1000, 1000);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 0, 0, 600, 128).unwrap();
        queue.flush();

        let mut chunks = Vec::new();
        let mut observer = |_: UpdateKind, area: IRect| chunks.push(area);
        queue.render_step(&mut cache, &mut observer).unwrap();
        queue.flush();
        queue.finish(&mut cache, &mut observer).unwrap();

        assert_eq!(
            chunks,
            [
                IRect::new(0, 0, 256, 128),
                IRect::new(256, 0, 256, 128),
                IRect::new(512, 0, 88, 128),
            ]
        );
    }

    #[test]
    fn restructure_queues_whole_projection() {
        let mut cache = cache(300, 300);
        let mut queue = UpdateQueue::new();
        queue.add_update_area(&cache, 0, 0, 10, 10).unwrap();
        queue.flush();
        queue.restructure(&cache);
        assert!(queue.is_idle());
        assert_eq!(queue.pending().bounds(), IRect::new(0, 0, 300, 300));

        queue.flush_now(&mut cache, &mut |_: UpdateKind, _: IRect| {}).unwrap();
        assert_eq!(cache.dirty().region().area(), 300 * 300);
    }

    #[test]
    fn unconfigured_cache_rejects_areas() {
        let cache = ProjectionCache::new(Nop, MemoryTileStore::new(TileGrid::default(), 4));
        let mut queue = UpdateQueue::new();
        assert_eq!(
            queue.add_update_area(&cache, 0, 0, 1, 1),
            Err(CacheError::NotConfigured)
        );
    }
}
