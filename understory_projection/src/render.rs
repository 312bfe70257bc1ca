// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel producer abstraction.

use alloc::borrow::Cow;

use crate::rect::IRect;

/// Memory layout of a destination buffer handed to a [`Renderer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PixelLayout {
    /// Bytes between the starts of two consecutive rows.
    pub stride: usize,
    /// Bytes per pixel.
    pub bytes_per_pixel: usize,
}

impl PixelLayout {
    /// Creates a layout.
    #[must_use]
    pub const fn new(stride: usize, bytes_per_pixel: usize) -> Self {
        Self {
            stride,
            bytes_per_pixel,
        }
    }

    /// Byte offset of pixel `(x, y)` from the start of the buffer.
    #[must_use]
    pub const fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * self.bytes_per_pixel
    }

    /// Bytes needed to hold a `width × height` block starting at offset 0.
    #[must_use]
    pub const fn span(&self, width: usize, height: usize) -> usize {
        if width == 0 || height == 0 {
            0
        } else {
            (height - 1) * self.stride + width * self.bytes_per_pixel
        }
    }
}

/// Failure to produce pixels for a rectangle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to render {rect:?}: {reason}")]
pub struct RenderError {
    /// The rectangle that could not be produced.
    pub rect: IRect,
    /// Human-readable cause.
    pub reason: Cow<'static, str>,
}

impl RenderError {
    /// Creates a render error for `rect`.
    pub fn new(rect: IRect, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            rect,
            reason: reason.into(),
        }
    }
}

/// Produces base-level pixels for arbitrary rectangles.
///
/// `dest` starts at the pixel corresponding to `rect`'s top-left corner; row
/// `i` of the result belongs at `dest[i * layout.stride..]`. Implementations
/// must not write past `layout.span(rect.width, rect.height)` bytes.
pub trait Renderer {
    /// Renders `rect` into `dest`.
    fn render(&self, rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError> {
        (**self).render(rect, dest, layout)
    }
}

/// Adapts a closure into a [`Renderer`].
///
/// ```
/// use understory_projection::{IRect, PixelLayout, RenderError, RenderFn, Renderer};
///
/// let white = RenderFn(|rect: IRect, dest: &mut [u8], layout: PixelLayout| {
///     for row in 0..rect.height as usize {
///         let start = row * layout.stride;
///         let len = rect.width as usize * layout.bytes_per_pixel;
///         dest[start..start + len].fill(0xff);
///     }
///     Ok::<(), RenderError>(())
/// });
///
/// let mut buf = [0_u8; 16];
/// white.render(IRect::new(0, 0, 2, 2), &mut buf, PixelLayout::new(8, 4)).unwrap();
/// assert!(buf.iter().all(|&b| b == 0xff));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct RenderFn<F>(pub F);

impl<F> Renderer for RenderFn<F>
where
    F: Fn(IRect, &mut [u8], PixelLayout) -> Result<(), RenderError>,
{
    fn render(&self, rect: IRect, dest: &mut [u8], layout: PixelLayout) -> Result<(), RenderError> {
        (self.0)(rect, dest, layout)
    }
}
