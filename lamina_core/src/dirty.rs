// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The registry uses multi-channel dirty tracking (via [`understory_dirty`])
//! to report which layers each commit touched. Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to logical parent. Accumulated translation and crop are
//!   inherited, so moving or cropping a layer marks its whole subtree.
//!
//! - **Local-only**: [`APPEARANCE`] (alpha, flags, color, content) and
//!   [`ORDER`] (z, relative anchor, layer stack) are marked with the default
//!   policy. Only the explicitly marked layer appears in the drain output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on the old and new parent of a
//!   reparent and on layer creation and destruction.
//!
//! # Consumption
//!
//! Callers never query dirty state directly.
//! [`LayerStore::take_changes`](crate::layer::LayerStore::take_changes)
//! drains every channel and surfaces the result as
//! [`LayerChanges`](crate::layer::LayerChanges).

use understory_dirty::Channel;

/// Position, crop, corner radius, content bounds or logical parent changed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Alpha, flags, color or buffer content changed.
pub const APPEARANCE: Channel = Channel::new(1);

/// Z, relative anchor or layer stack changed.
pub const ORDER: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
