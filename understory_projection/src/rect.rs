// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles in pixel space.

use smallvec::SmallVec;

/// An axis-aligned integer rectangle.
///
/// The rectangle covers `[x, x + width) × [y, y + height)`. Width and height
/// are never negative; a rectangle with a zero extent on either axis is
/// empty.
///
/// # Example
///
/// ```
/// use understory_projection::IRect;
///
/// let a = IRect::new(0, 0, 10, 10);
/// let b = IRect::new(5, 5, 10, 10);
/// assert_eq!(a.intersect(&b), IRect::new(5, 5, 5, 5));
/// assert!(IRect::new(3, 3, 0, 7).is_empty());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl IRect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle. Negative extents are clamped to zero.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Creates a rectangle from its inclusive top-left and exclusive
    /// bottom-right corners. Inverted corners yield an empty rectangle.
    #[must_use]
    pub const fn from_extents(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn x1(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn y1(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Returns the overlap of `self` and `other`, which may be empty.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        if x1 <= x0 || y1 <= y0 {
            Self::EMPTY
        } else {
            Self::from_extents(x0, y0, x1, y1)
        }
    }

    /// Returns `true` if `self` and `other` share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns `true` if every pixel of `other` lies inside `self`.
    ///
    /// An empty `other` is contained in anything.
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && other.x >= self.x
                && other.y >= self.y
                && other.x1() <= self.x1()
                && other.y1() <= self.y1())
    }

    /// Returns `true` if the pixel at `(x, y)` lies inside the rectangle.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x1() && y < self.y1()
    }

    /// Clips the rectangle to `[0, width) × [0, height)`.
    #[must_use]
    pub fn clip_to_size(&self, width: i32, height: i32) -> Self {
        self.intersect(&Self::new(0, 0, width, height))
    }

    /// Returns the rectangle moved by `(dx, dy)`.
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            width: self.width,
            height: self.height,
        }
    }

    /// Returns `self` minus `other` as at most four disjoint pieces.
    ///
    /// Pieces are produced as full-width top and bottom bands followed by
    /// left and right slivers of the overlapping rows.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> SmallVec<[Self; 4]> {
        let mut out = SmallVec::new();
        if self.is_empty() {
            return out;
        }
        let overlap = self.intersect(other);
        if overlap.is_empty() {
            out.push(*self);
            return out;
        }
        if self.y < overlap.y {
            out.push(Self::from_extents(self.x, self.y, self.x1(), overlap.y));
        }
        if overlap.y1() < self.y1() {
            out.push(Self::from_extents(self.x, overlap.y1(), self.x1(), self.y1()));
        }
        if self.x < overlap.x {
            out.push(Self::from_extents(self.x, overlap.y, overlap.x, overlap.y1()));
        }
        if overlap.x1() < self.x1() {
            out.push(Self::from_extents(overlap.x1(), overlap.y, self.x1(), overlap.y1()));
        }
        out
    }
}
