// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counters describing cache activity.

/// Running totals kept by a [`ProjectionCache`](crate::ProjectionCache).
///
/// Counters only grow until [`reset_stats`](crate::ProjectionCache::reset_stats)
/// is called and wrap on overflow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Base-level fetches that found nothing stale.
    pub fast_path_hits: u64,
    /// Base-level fetches that brought stale pixels up to date.
    pub revalidated_tiles: u64,
    /// Successful renderer calls.
    pub rendered_rects: u64,
    /// Failed renderer calls.
    pub render_failures: u64,
    /// Pyramid tiles voided.
    pub voided_tiles: u64,
}
