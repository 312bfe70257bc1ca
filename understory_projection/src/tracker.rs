// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty tracker: stale pixels of the base level.

use crate::rect::IRect;
use crate::region::RegionSet;

/// Tracks which base-level pixels no longer match what the renderer would
/// produce.
///
/// The dirty region is always clipped to the tracker's bounds
/// `[0, width) × [0, height)`. Every mutation bumps a generation counter
/// that callers can use to detect whether anything changed since they last
/// looked.
///
/// # Example
///
/// ```
/// use understory_projection::{DirtyTracker, IRect};
///
/// let mut tracker = DirtyTracker::new(100, 100);
/// tracker.mark_dirty(IRect::new(90, 90, 20, 20));
///
/// // Only the in-bounds part was recorded.
/// let stale = tracker.query(IRect::new(0, 0, 200, 200));
/// assert_eq!(stale.area(), 100);
///
/// tracker.clear_set(&stale);
/// assert!(tracker.is_clean());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DirtyTracker {
    dirty: RegionSet,
    width: i32,
    height: i32,
    generation: u64,
}

impl DirtyTracker {
    /// Creates a clean tracker for a `width × height` base level.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            dirty: RegionSet::new(),
            width: width.max(0),
            height: height.max(0),
            generation: 0,
        }
    }

    /// Returns the tracked bounds as a rectangle at the origin.
    #[must_use]
    pub fn bounds(&self) -> IRect {
        IRect::new(0, 0, self.width, self.height)
    }

    /// Changes the tracked bounds, dropping any dirtiness that falls outside.
    pub fn set_bounds(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        if !self.bounds().contains_rect(&self.dirty.bounds()) {
            self.dirty = self.dirty.intersect_copy(self.bounds());
            self.bump();
        }
    }

    /// Returns the current generation.
    ///
    /// The generation is incremented on every mutation that may have changed
    /// the dirty region.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the whole dirty region.
    #[must_use]
    pub fn region(&self) -> &RegionSet {
        &self.dirty
    }

    /// Returns `true` if nothing is dirty.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dirty.is_empty()
    }

    /// Marks the in-bounds part of `rect` dirty.
    ///
    /// Returns the clipped rectangle that was recorded, which is empty if
    /// `rect` lies entirely outside the bounds.
    pub fn mark_dirty(&mut self, rect: IRect) -> IRect {
        let clipped = rect.clip_to_size(self.width, self.height);
        if !clipped.is_empty() {
            self.dirty.union(clipped);
            self.bump();
        }
        clipped
    }

    /// Marks the whole bounds dirty.
    pub fn mark_all(&mut self) {
        self.mark_dirty(self.bounds());
    }

    /// Returns the dirty sub-rectangles overlapping `rect`.
    #[must_use]
    pub fn query(&self, rect: IRect) -> RegionSet {
        self.dirty.intersect_copy(rect)
    }

    /// Returns `true` if any pixel of `rect` is dirty.
    #[must_use]
    pub fn is_dirty_in(&self, rect: IRect) -> bool {
        self.dirty.intersects(rect)
    }

    /// Marks `rect` clean.
    pub fn clear(&mut self, rect: IRect) {
        if self.dirty.intersects(rect) {
            self.dirty.subtract(rect);
            self.bump();
        }
    }

    /// Marks every rectangle of `region` clean.
    ///
    /// Typically `region` is the result of an earlier [`query`](Self::query)
    /// whose pixels have since been re-rendered.
    pub fn clear_set(&mut self, region: &RegionSet) {
        if region.is_empty() {
            return;
        }
        self.dirty.subtract_region(region);
        self.bump();
    }

    /// Marks everything clean.
    pub fn clear_all(&mut self) {
        if !self.dirty.is_empty() {
            self.dirty.clear();
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
