// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched layer mutations.
//!
//! A [`Transaction`] records an ordered list of [`LayerOp`]s keyed by layer
//! handle. Nothing is validated while recording; the whole batch is checked
//! and applied as one unit by
//! [`LayerStore::commit`](crate::layer::LayerStore::commit).

use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::layer::{LayerFlags, LayerId, Rgb};
use crate::stack::LayerStack;

/// One field mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerOp {
    /// Sets the translation relative to the parent.
    SetPosition(Point),
    /// Sets or clears the layer-local crop.
    SetCrop(Option<Rect>),
    /// Sets the rounded corner radius. Negative and NaN radii store 0.
    SetCornerRadius(f64),
    /// Sets the alpha. Clamped to `[0, 1]` at commit; NaN stores 0.
    SetAlpha(f32),
    /// Overwrites the flag bits selected by `mask` with those of `value`.
    SetFlags {
        /// New bit values.
        value: LayerFlags,
        /// Which bits to overwrite.
        mask: LayerFlags,
    },
    /// Sets the sibling ordering key.
    SetZ(i32),
    /// Anchors the layer into `target`'s sibling group.
    SetRelativeLayer {
        /// Layer whose group is joined.
        target: LayerId,
        /// Key offset relative to `target`.
        offset: i32,
    },
    /// Drops the relative anchor; `z` applies again.
    ClearRelativeLayer,
    /// Sets the output tag used when the layer is a root.
    SetLayerStack(LayerStack),
    /// Sets the fill color of a color layer.
    SetColor(Rgb),
    /// Moves the layer under a new parent, or makes it a root.
    Reparent(Option<LayerId>),
}

impl LayerOp {
    /// Returns the other layer this op links to, if any.
    #[must_use]
    pub fn target(&self) -> Option<LayerId> {
        match *self {
            Self::SetRelativeLayer { target, .. } => Some(target),
            Self::Reparent(parent) => parent,
            _ => None,
        }
    }
}

/// An ordered batch of [`LayerOp`]s.
///
/// Setters return `&mut Self` so calls can be chained:
///
/// ```
/// use lamina_core::transaction::Transaction;
/// # use lamina_core::layer::{LayerKind, LayerStore};
/// # use lamina_core::stack::LayerStack;
/// # let mut store = LayerStore::new();
/// # let layer = store.create_layer("bg", LayerKind::Color, 32, 32, LayerStack(0));
///
/// let mut txn = Transaction::new();
/// txn.set_position(layer, 10.0, 20.0).set_alpha(layer, 0.5).set_z(layer, 3);
/// store.commit(&txn).unwrap();
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    ops: SmallVec<[(LayerId, LayerOp); 8]>,
}

impl Transaction {
    /// Creates an empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw op.
    pub fn push(&mut self, layer: LayerId, op: LayerOp) -> &mut Self {
        self.ops.push((layer, op));
        self
    }

    /// Sets the layer's translation relative to its parent.
    pub fn set_position(&mut self, layer: LayerId, x: f64, y: f64) -> &mut Self {
        self.push(layer, LayerOp::SetPosition(Point::new(x, y)))
    }

    /// Sets the layer-local crop rectangle.
    pub fn set_crop(&mut self, layer: LayerId, crop: Rect) -> &mut Self {
        self.push(layer, LayerOp::SetCrop(Some(crop)))
    }

    /// Removes the layer's crop.
    pub fn clear_crop(&mut self, layer: LayerId) -> &mut Self {
        self.push(layer, LayerOp::SetCrop(None))
    }

    /// Sets the rounded corner radius.
    pub fn set_corner_radius(&mut self, layer: LayerId, radius: f64) -> &mut Self {
        self.push(layer, LayerOp::SetCornerRadius(radius))
    }

    /// Sets the layer's alpha.
    pub fn set_alpha(&mut self, layer: LayerId, alpha: f32) -> &mut Self {
        self.push(layer, LayerOp::SetAlpha(alpha))
    }

    /// Overwrites the bits of `mask` with those of `value`.
    pub fn set_flags(&mut self, layer: LayerId, value: LayerFlags, mask: LayerFlags) -> &mut Self {
        self.push(layer, LayerOp::SetFlags { value, mask })
    }

    /// Sets the sibling ordering key.
    pub fn set_z(&mut self, layer: LayerId, z: i32) -> &mut Self {
        self.push(layer, LayerOp::SetZ(z))
    }

    /// Orders `layer` in `target`'s sibling group at `target`'s key plus
    /// `offset`.
    pub fn set_relative_layer(&mut self, layer: LayerId, target: LayerId, offset: i32) -> &mut Self {
        self.push(layer, LayerOp::SetRelativeLayer { target, offset })
    }

    /// Drops the layer's relative anchor.
    pub fn clear_relative_layer(&mut self, layer: LayerId) -> &mut Self {
        self.push(layer, LayerOp::ClearRelativeLayer)
    }

    /// Sets the output the layer is composited into when it is a root.
    pub fn set_layer_stack(&mut self, layer: LayerId, stack: LayerStack) -> &mut Self {
        self.push(layer, LayerOp::SetLayerStack(stack))
    }

    /// Sets the fill color of a color layer.
    pub fn set_color(&mut self, layer: LayerId, color: Rgb) -> &mut Self {
        self.push(layer, LayerOp::SetColor(color))
    }

    /// Moves `layer` under `parent`, or detaches it into a root with `None`.
    pub fn reparent(&mut self, layer: LayerId, parent: Option<LayerId>) -> &mut Self {
        self.push(layer, LayerOp::Reparent(parent))
    }

    /// Returns the recorded ops in submission order.
    #[must_use]
    pub fn ops(&self) -> &[(LayerId, LayerOp)] {
        &self.ops
    }

    /// Returns the number of recorded ops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if no ops were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Removes all recorded ops.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKind, LayerStore};

    #[test]
    fn setters_record_in_order() {
        let mut store = LayerStore::new();
        let a = store.create_layer("a", LayerKind::Container, 0, 0, LayerStack(0));
        let b = store.create_layer("b", LayerKind::Container, 0, 0, LayerStack(0));

        let mut txn = Transaction::new();
        txn.set_z(a, 1)
            .set_relative_layer(b, a, -1)
            .reparent(a, None);

        assert_eq!(txn.ops(), &[
            (a, LayerOp::SetZ(1)),
            (b, LayerOp::SetRelativeLayer { target: a, offset: -1 }),
            (a, LayerOp::Reparent(None)),
        ]);
        assert_eq!(txn.len(), 3);
    }

    #[test]
    fn target_reports_linked_layer() {
        let mut store = LayerStore::new();
        let a = store.create_layer("a", LayerKind::Container, 0, 0, LayerStack(0));

        assert_eq!(LayerOp::Reparent(Some(a)).target(), Some(a));
        assert_eq!(LayerOp::Reparent(None).target(), None);
        assert_eq!(
            LayerOp::SetRelativeLayer { target: a, offset: 2 }.target(),
            Some(a)
        );
        assert_eq!(LayerOp::SetZ(4).target(), None);
    }
}
