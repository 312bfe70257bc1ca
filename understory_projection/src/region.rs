// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region set: a union of disjoint integer rectangles.

use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::slice;

use smallvec::SmallVec;

use crate::rect::IRect;

/// A mutable set of pixels stored as pairwise-disjoint rectangles.
///
/// Only the covered area is meaningful; the particular decomposition into
/// rectangles is an implementation detail and may change across
/// [`union`](Self::union) and [`subtract`](Self::subtract) calls. Empty
/// rectangles are never stored.
///
/// # Example
///
/// ```
/// use understory_projection::{IRect, RegionSet};
///
/// let mut region = RegionSet::new();
/// region.union(IRect::new(0, 0, 10, 10));
/// region.union(IRect::new(5, 5, 10, 10));
/// assert_eq!(region.area(), 175);
///
/// region.subtract(IRect::new(0, 0, 20, 5));
/// let inside = region.intersect_copy(IRect::new(0, 0, 6, 6));
/// assert_eq!(inside.area(), 6);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionSet {
    rects: Vec<IRect>,
}

impl RegionSet {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of rectangles in the current decomposition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(IRect::area).sum()
    }

    /// Smallest rectangle enclosing the whole region, or [`IRect::EMPTY`].
    #[must_use]
    pub fn bounds(&self) -> IRect {
        let mut iter = self.rects.iter();
        let Some(first) = iter.next() else {
            return IRect::EMPTY;
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x1(), first.y1());
        for r in iter {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.x1());
            y1 = y1.max(r.y1());
        }
        IRect::from_extents(x0, y0, x1, y1)
    }

    /// Removes everything from the region.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Removes one rectangle from the region and returns it.
    pub fn pop(&mut self) -> Option<IRect> {
        self.rects.pop()
    }

    /// Adds `rect` to the covered area.
    pub fn union(&mut self, rect: IRect) {
        if rect.is_empty() || self.rects.iter().any(|r| r.contains_rect(&rect)) {
            return;
        }
        self.rects.retain(|r| !rect.contains_rect(r));

        let mut pieces: SmallVec<[IRect; 4]> = SmallVec::new();
        pieces.push(rect);
        for existing in &self.rects {
            if !existing.intersects(&rect) {
                continue;
            }
            pieces = pieces
                .iter()
                .flat_map(|p| p.subtract(existing))
                .collect();
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
        self.coalesce();
        self.debug_check_disjoint();
    }

    /// Removes the intersection of `rect` with the covered area.
    pub fn subtract(&mut self, rect: IRect) {
        if rect.is_empty() || !self.rects.iter().any(|r| r.intersects(&rect)) {
            return;
        }
        let mut kept = Vec::with_capacity(self.rects.len() + 3);
        for r in &self.rects {
            if r.intersects(&rect) {
                kept.extend(r.subtract(&rect));
            } else {
                kept.push(*r);
            }
        }
        self.rects = kept;
        self.debug_check_disjoint();
    }

    /// Removes every rectangle of `other` from this region.
    pub fn subtract_region(&mut self, other: &Self) {
        for r in other.rectangles() {
            self.subtract(r);
        }
    }

    /// Returns a new region equal to `self ∩ rect`.
    #[must_use]
    pub fn intersect_copy(&self, rect: IRect) -> Self {
        if rect.is_empty() {
            return Self::new();
        }
        Self {
            rects: self
                .rects
                .iter()
                .map(|r| r.intersect(&rect))
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if any pixel of `rect` is in the region.
    #[must_use]
    pub fn intersects(&self, rect: IRect) -> bool {
        self.rects.iter().any(|r| r.intersects(&rect))
    }

    /// Returns `true` if every pixel of `rect` is in the region.
    #[must_use]
    pub fn contains_rect(&self, rect: IRect) -> bool {
        let mut rest = Self::new();
        rest.union(rect);
        rest.subtract_region(self);
        rest.is_empty()
    }

    /// Iterates the disjoint rectangles making up the region.
    ///
    /// The order is deterministic for a given region state but otherwise
    /// unspecified. Call again to restart.
    pub fn rectangles(&self) -> Rectangles<'_> {
        Rectangles {
            inner: self.rects.iter(),
        }
    }

    /// Merges neighbours that share a full edge.
    fn coalesce(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(joined) = join(&self.rects[i], &self.rects[j]) {
                        self.rects[i] = joined;
                        self.rects.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }

    fn debug_check_disjoint(&self) {
        if cfg!(debug_assertions) {
            for (i, a) in self.rects.iter().enumerate() {
                debug_assert!(!a.is_empty(), "empty rectangle stored in region");
                for b in &self.rects[i + 1..] {
                    debug_assert!(!a.intersects(b), "region rectangles {a:?} and {b:?} overlap");
                }
            }
        }
    }
}

/// Returns the union of `a` and `b` if it is itself a rectangle.
fn join(a: &IRect, b: &IRect) -> Option<IRect> {
    if a.y == b.y && a.height == b.height && (a.x1() == b.x || b.x1() == a.x) {
        Some(IRect::from_extents(a.x.min(b.x), a.y, a.x1().max(b.x1()), a.y1()))
    } else if a.x == b.x && a.width == b.width && (a.y1() == b.y || b.y1() == a.y) {
        Some(IRect::from_extents(a.x, a.y.min(b.y), a.x1(), a.y1().max(b.y1())))
    } else {
        None
    }
}

impl From<IRect> for RegionSet {
    fn from(rect: IRect) -> Self {
        let mut region = Self::new();
        region.union(rect);
        region
    }
}

impl Extend<IRect> for RegionSet {
    fn extend<I: IntoIterator<Item = IRect>>(&mut self, iter: I) {
        for rect in iter {
            self.union(rect);
        }
    }
}

impl FromIterator<IRect> for RegionSet {
    fn from_iter<I: IntoIterator<Item = IRect>>(iter: I) -> Self {
        let mut region = Self::new();
        region.extend(iter);
        region
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = IRect;
    type IntoIter = Rectangles<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rectangles()
    }
}

/// Iterator over the rectangles of a [`RegionSet`].
///
/// Returned by [`RegionSet::rectangles`].
#[derive(Clone, Debug)]
pub struct Rectangles<'a> {
    inner: slice::Iter<'a, IRect>,
}

impl Iterator for Rectangles<'_> {
    type Item = IRect;

    fn next(&mut self) -> Option<IRect> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Rectangles<'_> {}

impl FusedIterator for Rectangles<'_> {}
