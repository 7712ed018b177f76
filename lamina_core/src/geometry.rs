// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated placement and rounded-corner masks.
//!
//! Every layer is placed in output space by walking its logical ancestry:
//!
//! - **Translation** is the sum of the layer's and every ancestor's position.
//! - **Clip** starts from the layer's own crop (or its content bounds when it
//!   has no crop) and is intersected with every ancestor's crop. Content
//!   bounds of ancestors never clip descendants.
//! - **Masks** are collected from the layer and every ancestor with a
//!   positive corner radius. Each mask covers its owner's crop (or bounds)
//!   and only affects pixels that fall in one of its four corner squares.
//!
//! All rectangles here are in output space (pixels of the destination).

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::layer::LayerTable;

/// A clip rectangle that excludes nothing.
pub const UNBOUNDED: Rect = Rect::new(
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::INFINITY,
);

/// Side length of the per-pixel supersample grid used for mask coverage.
pub const MASK_SAMPLES: u32 = 4;

/// A rounded-rectangle coverage mask in output space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerMask {
    rect: Rect,
    radius: f64,
}

impl CornerMask {
    /// Creates a mask, clamping `radius` to half the shorter side.
    ///
    /// Returns `None` when the mask would have no effect (non-positive
    /// radius or an empty rectangle).
    #[must_use]
    pub fn new(rect: Rect, radius: f64) -> Option<Self> {
        let rect = rect.abs();
        let radius = radius.min(rect.width().min(rect.height()) * 0.5);
        (radius > 0.0 && rect.area() > 0.0).then_some(Self { rect, radius })
    }

    /// The masked rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The effective (clamped) radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns whether `p` is inside the rounded rectangle, treating
    /// everything outside the corner squares as inside.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let Rect { x0, y0, x1, y1 } = self.rect;
        let r = self.radius;
        if p.x < x0 || p.x >= x1 || p.y < y0 || p.y >= y1 {
            return true;
        }
        let cx = if p.x < x0 + r {
            x0 + r
        } else if p.x > x1 - r {
            x1 - r
        } else {
            return true;
        };
        let cy = if p.y < y0 + r {
            y0 + r
        } else if p.y > y1 - r {
            y1 - r
        } else {
            return true;
        };
        let d = p - Point::new(cx, cy);
        d.hypot2() <= r * r
    }

    /// Returns the fraction of pixel `(x, y)` (the unit square at that
    /// integer corner) covered by the mask.
    ///
    /// Pixels that touch no corner square are fully covered. Others are
    /// sampled on a fixed [`MASK_SAMPLES`] x [`MASK_SAMPLES`] grid, so the
    /// result only depends on the inputs.
    #[must_use]
    pub fn coverage(&self, x: i32, y: i32) -> f32 {
        let px = f64::from(x);
        let py = f64::from(y);
        if !self.touches_corner(Rect::new(px, py, px + 1.0, py + 1.0)) {
            return 1.0;
        }
        let step = 1.0 / f64::from(MASK_SAMPLES);
        let mut inside = 0_u32;
        for j in 0..MASK_SAMPLES {
            for i in 0..MASK_SAMPLES {
                let sample = Point::new(
                    px + (f64::from(i) + 0.5) * step,
                    py + (f64::from(j) + 0.5) * step,
                );
                if self.contains(sample) {
                    inside += 1;
                }
            }
        }
        let total = (MASK_SAMPLES * MASK_SAMPLES) as f32;
        let hit = inside as f32;
        hit / total
    }

    fn touches_corner(&self, pixel: Rect) -> bool {
        let Rect { x0, y0, x1, y1 } = self.rect;
        let r = self.radius;
        let corners = [
            Rect::new(x0, y0, x0 + r, y0 + r),
            Rect::new(x1 - r, y0, x1, y0 + r),
            Rect::new(x0, y1 - r, x0 + r, y1),
            Rect::new(x1 - r, y1 - r, x1, y1),
        ];
        corners.iter().any(|c| c.overlaps(pixel))
    }
}

/// Where and how a layer lands in output space.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Sum of the layer's and its ancestors' positions.
    pub translation: Vec2,
    /// Accumulated clip; may be [`UNBOUNDED`] or empty.
    pub clip: Rect,
    /// Masks of the layer and its rounded ancestors, innermost first.
    pub masks: SmallVec<[CornerMask; 2]>,
}

impl Placement {
    /// Returns whether nothing of the layer can be visible.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.clip.width() > 0.0 && self.clip.height() > 0.0)
    }

    /// Returns the combined mask coverage of pixel `(x, y)`: the minimum of
    /// every mask's coverage.
    #[must_use]
    pub fn mask_coverage(&self, x: i32, y: i32) -> f32 {
        self.masks
            .iter()
            .map(|mask| mask.coverage(x, y))
            .fold(1.0, f32::min)
    }
}

/// Computes the placement of the live layer at raw slot `idx`.
#[must_use]
pub fn place(table: &LayerTable, idx: u32) -> Placement {
    let mut chain: SmallVec<[u32; 8]> = SmallVec::new();
    let mut cur = Some(idx);
    while let Some(i) = cur {
        chain.push(i);
        cur = table.parent_at(i);
    }

    // Translation of each chain member, accumulated from the root down.
    let mut offsets: SmallVec<[Vec2; 8]> = SmallVec::from_elem(Vec2::ZERO, chain.len());
    let mut acc = Vec2::ZERO;
    for (k, &i) in chain.iter().enumerate().rev() {
        acc += table.position_at(i).to_vec2();
        offsets[k] = acc;
    }

    let own = table.crop_at(idx).or_else(|| table.bounds_at(idx));
    let mut clip = own.map_or(UNBOUNDED, |r| r.abs() + offsets[0]);
    for (&i, &offset) in chain.iter().zip(offsets.iter()).skip(1) {
        if let Some(crop) = table.crop_at(i) {
            clip = clip.intersect(crop.abs() + offset);
        }
    }

    let mut masks = SmallVec::new();
    for (&i, &offset) in chain.iter().zip(offsets.iter()) {
        let radius = table.corner_radius_at(i);
        if radius <= 0.0 {
            continue;
        }
        let area = table.crop_at(i).or_else(|| table.bounds_at(i));
        if let Some(mask) = area.and_then(|r| CornerMask::new(r + offset, radius)) {
            masks.push(mask);
        }
    }

    Placement {
        translation: offsets[0],
        clip,
        masks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKind, LayerStore};
    use crate::stack::LayerStack;
    use crate::transaction::Transaction;

    #[test]
    fn radius_is_clamped_to_half_side() {
        let mask = CornerMask::new(Rect::new(0.0, 0.0, 10.0, 40.0), 100.0).unwrap();
        assert_eq!(mask.radius(), 5.0);
        assert!(CornerMask::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0).is_none());
        assert!(CornerMask::new(Rect::new(0.0, 0.0, 0.0, 10.0), 4.0).is_none());
    }

    #[test]
    fn corner_pixels_are_masked() {
        let mask = CornerMask::new(Rect::new(0.0, 0.0, 64.0, 64.0), 20.0).unwrap();
        assert_eq!(mask.coverage(0, 0), 0.0);
        assert_eq!(mask.coverage(63, 63), 0.0);
        assert_eq!(mask.coverage(32, 32), 1.0);
        assert_eq!(mask.coverage(32, 0), 1.0);
        // Outside the rectangle the mask does not apply.
        assert_eq!(mask.coverage(-5, -5), 1.0);
    }

    #[test]
    fn edge_of_arc_is_partial() {
        let mask = CornerMask::new(Rect::new(0.0, 0.0, 64.0, 64.0), 20.0).unwrap();
        // The arc passes through this pixel: (20 - 20 / sqrt 2) ~= 5.86.
        let c = mask.coverage(5, 5);
        assert!(c > 0.0 && c < 1.0, "coverage {c}");
    }

    #[test]
    fn placement_accumulates_translation_and_crops() {
        let mut store = LayerStore::new();
        let parent = store.create_layer("p", LayerKind::Container, 0, 0, LayerStack(0));
        let child = store.create_layer("c", LayerKind::Color, 100, 100, LayerStack(0));
        let mut txn = Transaction::new();
        txn.reparent(child, Some(parent))
            .set_position(parent, 10.0, 20.0)
            .set_crop(parent, Rect::new(0.0, 0.0, 30.0, 30.0))
            .set_position(child, 5.0, 5.0);
        store.commit(&txn).unwrap();

        let p = place(&store, child.index());
        assert_eq!(p.translation, Vec2::new(15.0, 25.0));
        assert_eq!(p.clip, Rect::new(15.0, 25.0, 40.0, 50.0));
        assert!(p.masks.is_empty());
    }

    #[test]
    fn container_without_crop_is_unbounded() {
        let mut store = LayerStore::new();
        let root = store.create_layer("root", LayerKind::Container, 0, 0, LayerStack(0));
        assert_eq!(place(&store, root.index()).clip, UNBOUNDED);
    }

    #[test]
    fn empty_buffer_layer_is_degenerate() {
        let mut store = LayerStore::new();
        let id = store.create_layer("buf", LayerKind::BufferQueue, 16, 16, LayerStack(0));
        assert!(place(&store, id.index()).is_degenerate());
    }

    #[test]
    fn zero_size_color_layer_is_degenerate() {
        let mut store = LayerStore::new();
        let wide = store.create_layer("w", LayerKind::Color, 16, 0, LayerStack(0));
        let empty = store.create_layer("e", LayerKind::Color, 0, 0, LayerStack(0));
        assert!(place(&store, wide.index()).is_degenerate());
        assert!(place(&store, empty.index()).is_degenerate());
    }

    #[test]
    fn zero_area_ancestor_crop_culls_descendants() {
        let mut store = LayerStore::new();
        let parent = store.create_layer("p", LayerKind::Container, 0, 0, LayerStack(0));
        let child = store.create_layer("c", LayerKind::Color, 16, 16, LayerStack(0));
        let mut txn = Transaction::new();
        txn.reparent(child, Some(parent))
            .set_crop(parent, Rect::new(4.0, 4.0, 4.0, 12.0));
        store.commit(&txn).unwrap();
        assert!(place(&store, child.index()).is_degenerate());
    }

    #[test]
    fn ancestor_mask_is_carried() {
        let mut store = LayerStore::new();
        let parent = store.create_layer("p", LayerKind::Color, 64, 64, LayerStack(0));
        let child = store.create_layer("c", LayerKind::Color, 64, 32, LayerStack(0));
        let mut txn = Transaction::new();
        txn.reparent(child, Some(parent))
            .set_corner_radius(parent, 20.0)
            .set_position(child, 0.0, 32.0);
        store.commit(&txn).unwrap();

        let p = place(&store, child.index());
        assert_eq!(p.masks.len(), 1);
        // Straight top edge of the child, rounded bottom corners from the parent.
        assert_eq!(p.mask_coverage(0, 32), 1.0);
        assert_eq!(p.mask_coverage(0, 63), 0.0);
    }
}
