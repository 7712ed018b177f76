// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer property types.

use super::id::LayerId;

/// What a layer draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Content arrives through a producer queue; the latest buffer is shown.
    BufferQueue,
    /// Content is set directly as buffer state on the layer.
    BufferState,
    /// A flat fill of the layer's [`color`](crate::layer::LayerRecord::color).
    Color,
    /// No content of its own; groups children (e.g. to share a crop).
    Container,
}

impl LayerKind {
    /// Returns whether the layer can hold submitted buffer content.
    #[inline]
    #[must_use]
    pub const fn is_buffer_backed(self) -> bool {
        matches!(self, Self::BufferQueue | Self::BufferState)
    }
}

bitflags::bitflags! {
    /// Per-layer flag bits.
    ///
    /// Flags are updated with a mask (see
    /// [`Transaction::set_flags`](crate::transaction::Transaction::set_flags)),
    /// so bits outside the mask are preserved.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u32 {
        /// The layer's own content is not composited. Children are unaffected.
        const HIDDEN = 1 << 0;
        /// The written destination alpha under the layer is forced to opaque.
        const OPAQUE = 1 << 1;
    }
}

impl LayerFlags {
    /// Overwrites the bits selected by `mask` with the bits of `value`.
    #[inline]
    #[must_use]
    pub fn masked(self, value: Self, mask: Self) -> Self {
        (self & !mask) | (value & mask)
    }
}

/// A linear RGB fill color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    /// Pure red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);
    /// Pure green.
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);
    /// Pure blue.
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a color from its channels.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Decides which sibling group a layer is ordered in.
///
/// Derived from a layer's `z` and relative anchor: an anchor overrides `z`
/// for ordering purposes while it is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderKey {
    /// Ordered among the logical parent's children (or the layer stack's
    /// roots) by `z`.
    UnderParent(i32),
    /// Ordered in whatever group `target` is ordered in, at `target`'s key
    /// plus `offset`.
    RelativeTo {
        /// The layer whose sibling group is joined.
        target: LayerId,
        /// Key offset relative to the target.
        offset: i32,
    },
}
