// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software compositor.
//!
//! Items are blended back to front into an RGBA8 destination that starts as
//! opaque black. For each pixel whose center lies inside an item's clip:
//!
//! 1. The source is sampled: a color fill is `(r, g, b, 1)`; a buffer is
//!    sampled nearest at `floor(center - translation)` and contributes
//!    nothing outside its texels. Items with
//!    [`BlendMode::SourceOverOpaque`] treat the texel alpha as 1.
//! 2. The premultiplied source is scaled by `alpha * mask coverage`.
//! 3. It is blended source-over onto the destination. Opaque items then
//!    force the written alpha to 255.
//!
//! Channels are quantized with round-half-up, so output is reproducible
//! bit for bit.

use kurbo::Rect;
use lamina_core::buffer::{PixelBuffer, Rgba8};

use crate::plan::{BlendMode, RenderItem, RenderPlan, Source};

/// An integer pixel rectangle in output space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl PixelRect {
    /// Creates a rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rounds each edge of `rect` to the nearest integer.
    ///
    /// Inverted or empty rectangles produce a zero-sized region.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let r = rect.round();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "capture regions are clamped to the i32 range first"
        )]
        let edge = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        let (x0, y0, x1, y1) = (edge(r.x0), edge(r.y0), edge(r.x1), edge(r.y1));
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0).max(0).unsigned_abs(),
            height: y1.saturating_sub(y0).max(0).unsigned_abs(),
        }
    }

    /// Returns the rectangle as a `kurbo` rectangle.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }
}

/// Renders `plan` over an opaque black buffer covering `region`.
///
/// Returns the buffer and the number of items that touched at least one
/// pixel.
#[must_use]
pub fn composite(plan: &RenderPlan, region: PixelRect) -> (PixelBuffer, u32) {
    let mut dest = PixelBuffer::filled(region.width, region.height, Rgba8::BLACK);
    let mut painted = 0;
    for item in &plan.items {
        if draw_item(item, region, &mut dest) {
            painted += 1;
        }
    }
    (dest, painted)
}

/// Blends one item into `dest`; returns whether any pixel was written.
fn draw_item(item: &RenderItem, region: PixelRect, dest: &mut PixelBuffer) -> bool {
    let Some((x0, y0, x1, y1)) = pixel_span(item.placement.clip, region) else {
        return false;
    };
    let translation = item.placement.translation;
    let opaque = item.blend_mode == BlendMode::SourceOverOpaque;
    let mut touched = false;

    for py in y0..y1 {
        for px in x0..x1 {
            let Some(mut src) = sample(&item.source, px, py, translation) else {
                continue;
            };
            if opaque {
                src[3] = 1.0;
            }
            let coverage = item.alpha * item.placement.mask_coverage(px, py);
            if coverage <= 0.0 {
                continue;
            }

            let dx = (px - region.x).unsigned_abs();
            let dy = (py - region.y).unsigned_abs();
            let Some(d) = dest.get(dx, dy) else {
                continue;
            };
            let s = src.map(|c| c * coverage);
            let inv = 1.0 - s[3];
            let dst = [d.r, d.g, d.b, d.a].map(unit);
            let mut out = [
                s[0] + dst[0] * inv,
                s[1] + dst[1] * inv,
                s[2] + dst[2] * inv,
                s[3] + dst[3] * inv,
            ];
            if opaque {
                out[3] = 1.0;
            }
            dest.set(
                dx,
                dy,
                Rgba8::new(quantize(out[0]), quantize(out[1]), quantize(out[2]), quantize(out[3])),
            );
            touched = true;
        }
    }
    touched
}

/// Returns the half-open pixel range `[x0, x1) x [y0, y1)` of `region` whose
/// centers lie inside `clip`.
fn pixel_span(clip: Rect, region: PixelRect) -> Option<(i32, i32, i32, i32)> {
    let bounds = clip.intersect(region.to_rect());
    if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
        return None;
    }
    // Pixel p is inside when bounds.x0 <= p + 0.5 < bounds.x1.
    let first = |v: f64| -floor_i32(0.5 - v);
    let (x0, y0, x1, y1) = (
        first(bounds.x0),
        first(bounds.y0),
        first(bounds.x1),
        first(bounds.y1),
    );
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Premultiplied source color at output pixel `(px, py)` in `[0, 1]`.
fn sample(source: &Source, px: i32, py: i32, translation: kurbo::Vec2) -> Option<[f32; 4]> {
    match source {
        Source::Color(rgb) => Some([
            rgb.r.clamp(0.0, 1.0),
            rgb.g.clamp(0.0, 1.0),
            rgb.b.clamp(0.0, 1.0),
            1.0,
        ]),
        Source::Buffer(buffer) => {
            let lx = floor_i32(f64::from(px) + 0.5 - translation.x);
            let ly = floor_i32(f64::from(py) + 0.5 - translation.y);
            let x = u32::try_from(lx).ok()?;
            let y = u32::try_from(ly).ok()?;
            let texel = buffer.get(x, y)?;
            Some([texel.r, texel.g, texel.b, texel.a].map(unit))
        }
    }
}

#[inline]
fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to [0, 255] first"
)]
fn quantize(v: f32) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// `floor` without `std`, saturating at the `i32` range.
#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate"
)]
fn floor_i32(v: f64) -> i32 {
    let t = v as i32;
    if f64::from(t) > v { t.saturating_sub(1) } else { t }
}
