// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned view of one layer.

use alloc::sync::Arc;

use kurbo::{Point, Rect};

use super::id::LayerId;
use super::props::{LayerFlags, LayerKind, OrderKey, Rgb};
use crate::buffer::PixelBuffer;
use crate::stack::LayerStack;

/// A copy of every property of one layer at a given generation.
///
/// Returned by [`LayerTable::layer`](super::LayerTable::layer). Content is
/// shared, not copied.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerRecord {
    /// The layer's handle.
    pub id: LayerId,
    /// Debug name given at creation.
    pub name: Arc<str>,
    /// What the layer draws.
    pub kind: LayerKind,
    /// Width given at creation.
    pub width: u32,
    /// Height given at creation.
    pub height: u32,
    /// Creation counter; breaks ties between equal ordering keys.
    pub sequence: u64,
    /// Logical parent, or `None` for roots and orphans.
    pub parent: Option<LayerId>,
    /// Relative anchor target and key offset.
    pub relative: Option<(LayerId, i32)>,
    /// Whether the parent or anchor target was destroyed.
    pub orphaned: bool,
    /// Sibling ordering key.
    pub z: i32,
    /// Translation relative to the parent.
    pub position: Point,
    /// Crop in layer-local coordinates.
    pub crop: Option<Rect>,
    /// Rounded corner radius.
    pub corner_radius: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Flag bits.
    pub flags: LayerFlags,
    /// Fill color; only meaningful for [`LayerKind::Color`].
    pub color: Rgb,
    /// Output the layer is composited into when it is a root.
    pub layer_stack: LayerStack,
    /// Most recently submitted buffer.
    pub content: Option<Arc<PixelBuffer>>,
}

impl LayerRecord {
    /// Returns the key this layer is ordered by.
    #[must_use]
    pub fn order_key(&self) -> OrderKey {
        match self.relative {
            Some((target, offset)) => OrderKey::RelativeTo { target, offset },
            None => OrderKey::UnderParent(self.z),
        }
    }

    /// Returns whether the layer's own content is hidden.
    #[inline]
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(LayerFlags::HIDDEN)
    }
}
