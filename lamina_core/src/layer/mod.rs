// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer registry data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]): a generational handle that becomes stale when
//!   the layer is destroyed.
//! - Topology: parent, first-child and sibling links forming a tree, plus an
//!   optional *relative anchor* that orders the layer in another layer's
//!   sibling group.
//! - Properties set through [`Transaction`](crate::transaction::Transaction)s:
//!   position, crop, corner radius, alpha, [`LayerFlags`], `z`, fill color
//!   and [`LayerStack`](crate::stack::LayerStack).
//! - Content: the latest [`PixelBuffer`](crate::buffer::PixelBuffer) for
//!   buffer-backed [`LayerKind`]s.
//!
//! Layers are stored in a struct-of-arrays [`LayerTable`] with index-based
//! handles. [`LayerStore`] owns the table and is the only writer.
//!
//! # Dirty tracking
//!
//! Mutations mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)):
//!
//! - **GEOMETRY**: propagates to all descendants, since translation and
//!   crop are inherited.
//! - **APPEARANCE** / **ORDER**: local-only.
//! - **TOPOLOGY**: reparenting, creation and destruction.

mod changes;
mod id;
mod props;
mod record;
mod store;
mod table;
mod traverse;

pub use changes::LayerChanges;
pub use id::{INVALID, LayerId};
pub use props::{LayerFlags, LayerKind, OrderKey, Rgb};
pub use record::LayerRecord;
pub use store::LayerStore;
pub use table::LayerTable;
pub use traverse::Children;
