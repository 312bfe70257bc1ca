// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in [`TileStore`](crate::TileStore) implementations.

pub mod memory;
