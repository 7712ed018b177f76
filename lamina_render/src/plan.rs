// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one capture.

use alloc::sync::Arc;
use alloc::vec::Vec;

use lamina_core::buffer::PixelBuffer;
use lamina_core::geometry::Placement;
use lamina_core::layer::{LayerFlags, LayerId, LayerKind, Rgb};
use lamina_core::resolve::PaintOrder;
use lamina_core::snapshot::Snapshot;
use lamina_core::stack::{Generation, LayerStack};

/// Blend mode for compositing a render item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Premultiplied source-over.
    #[default]
    SourceOver,
    /// Source-over with the content alpha treated as 1; the written alpha
    /// is forced to opaque wherever the item covers a pixel.
    SourceOverOpaque,
}

/// What a render item samples.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// A flat, fully opaque fill.
    Color(Rgb),
    /// Premultiplied texels, sampled nearest at the item's translation.
    Buffer(Arc<PixelBuffer>),
}

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the resolved paint
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The layer this item originates from.
    pub layer: LayerId,
    /// Content to draw.
    pub source: Source,
    /// Layer alpha in `(0, 1]`. Not inherited from ancestors.
    pub alpha: f32,
    /// Output-space translation, clip and corner masks.
    pub placement: Placement,
    /// Blend mode.
    pub blend_mode: BlendMode,
}

/// An ordered list of draw commands for one layer stack at one generation.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Generation the plan was built from.
    pub generation: Generation,
    /// Layer stack the plan draws.
    pub layer_stack: LayerStack,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan for the given layer stack.
    #[must_use]
    pub fn new(generation: Generation, layer_stack: LayerStack) -> Self {
        Self {
            generation,
            layer_stack,
            items: Vec::new(),
        }
    }

    /// Builds a plan from a resolved paint order.
    ///
    /// Entries are dropped when they belong to another layer stack, are
    /// hidden, have zero alpha, have degenerate geometry, or have nothing to
    /// draw (containers, and buffer-backed layers without content).
    #[must_use]
    pub fn build(snapshot: &Snapshot, order: &PaintOrder) -> Self {
        let mut plan = Self::new(order.generation(), order.layer_stack());
        for entry in order.entries() {
            if entry.layer_stack != order.layer_stack() || entry.hidden {
                continue;
            }
            if entry.placement.is_degenerate() {
                continue;
            }
            let idx = entry.layer.index();
            let alpha = snapshot.alpha_at(idx);
            if alpha <= 0.0 {
                continue;
            }
            let source = match snapshot.kind_at(idx) {
                LayerKind::Color => Source::Color(snapshot.color_at(idx)),
                LayerKind::BufferQueue | LayerKind::BufferState => {
                    match snapshot.content_at(idx) {
                        Some(buffer) if !buffer.is_empty() => Source::Buffer(Arc::clone(buffer)),
                        _ => continue,
                    }
                }
                LayerKind::Container => continue,
            };
            let blend_mode = if snapshot.flags_at(idx).contains(LayerFlags::OPAQUE) {
                BlendMode::SourceOverOpaque
            } else {
                BlendMode::SourceOver
            };
            plan.items.push(RenderItem {
                layer: entry.layer,
                source,
                alpha,
                placement: entry.placement.clone(),
                blend_mode,
            });
        }
        plan
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use lamina_core::layer::LayerStore;
    use lamina_core::resolve::resolve;
    use lamina_core::transaction::Transaction;

    use super::*;

    #[test]
    fn plan_skips_invisible_entries() {
        let mut store = LayerStore::new();
        let shown = store.create_layer("shown", LayerKind::Color, 4, 4, LayerStack(0));
        let hidden = store.create_layer("hidden", LayerKind::Color, 4, 4, LayerStack(0));
        let clear = store.create_layer("clear", LayerKind::Color, 4, 4, LayerStack(0));
        let group = store.create_layer("group", LayerKind::Container, 0, 0, LayerStack(0));
        let empty = store.create_layer("empty", LayerKind::BufferQueue, 4, 4, LayerStack(0));

        let mut txn = Transaction::new();
        txn.set_color(shown, Rgb::RED)
            .set_flags(hidden, LayerFlags::HIDDEN, LayerFlags::HIDDEN)
            .set_alpha(clear, 0.0);
        store.commit(&txn).unwrap();

        let snapshot = store.snapshot();
        let order = resolve(&snapshot, LayerStack(0));
        let resolved: Vec<_> = order.layers().collect();
        assert_eq!(resolved, [shown, hidden, clear, group, empty]);

        let plan = RenderPlan::build(&snapshot, &order);
        let layers: Vec<_> = plan.items.iter().map(|item| item.layer).collect();
        assert_eq!(layers, [shown]);
        assert_eq!(plan.items[0].source, Source::Color(Rgb::RED));
    }

    #[test]
    fn opaque_flag_selects_blend_mode() {
        let mut store = LayerStore::new();
        let id = store.create_layer("a", LayerKind::Color, 4, 4, LayerStack(0));
        let mut txn = Transaction::new();
        txn.set_flags(id, LayerFlags::OPAQUE, LayerFlags::OPAQUE);
        store.commit(&txn).unwrap();

        let snapshot = store.snapshot();
        let plan = RenderPlan::build(&snapshot, &resolve(&snapshot, LayerStack(0)));
        assert_eq!(plan.items[0].blend_mode, BlendMode::SourceOverOpaque);
    }

    #[test]
    fn buffer_layer_ignores_color() {
        let mut store = LayerStore::new();
        let id = store.create_layer("buf", LayerKind::BufferState, 2, 2, LayerStack(0));
        let buffer = Arc::new(PixelBuffer::new(2, 2));
        store.submit_buffer(id, Arc::clone(&buffer)).unwrap();
        let mut txn = Transaction::new();
        txn.set_color(id, Rgb::BLUE);
        store.commit(&txn).unwrap();

        let snapshot = store.snapshot();
        let plan = RenderPlan::build(&snapshot, &resolve(&snapshot, LayerStack(0)));
        assert_eq!(plan.items[0].source, Source::Buffer(buffer));
    }
}
