// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color assertions over captured pixels.
//!
//! [`ScreenCapture`] wraps a captured [`PixelBuffer`] and checks that regions
//! of it hold an expected color, within a per-channel tolerance. The
//! `expect_*` methods panic with the first mismatching pixel; the `check_*`
//! methods return it as a [`CheckError`].
//!
//! Regions are given in the capture's own pixel coordinates and must lie
//! inside the buffer.

#![no_std]

extern crate alloc;

use kurbo::Rect;
use lamina_core::buffer::{PixelBuffer, Rgba8};

/// The first pixel that failed a color check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("pixel ({x}, {y}) is {actual:?}, expected {expected:?} (tolerance {tolerance})")]
pub struct ColorMismatch {
    /// Column of the pixel.
    pub x: u32,
    /// Row of the pixel.
    pub y: u32,
    /// The color the check expected.
    pub expected: Rgba8,
    /// The color found.
    pub actual: Rgba8,
    /// Maximum allowed per-channel difference.
    pub tolerance: u8,
}

/// Why a capture check failed.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum CheckError {
    /// A pixel differs from the expected color.
    #[error(transparent)]
    Color(#[from] ColorMismatch),
    /// The checked region reaches outside the capture.
    #[error("region {region:?} is outside the {width}x{height} capture")]
    OutOfBounds {
        /// The rounded region that was checked.
        region: Rect,
        /// Capture width.
        width: u32,
        /// Capture height.
        height: u32,
    },
}

/// A captured buffer under test.
#[derive(Clone, Debug)]
pub struct ScreenCapture {
    buffer: PixelBuffer,
}

impl From<PixelBuffer> for ScreenCapture {
    fn from(buffer: PixelBuffer) -> Self {
        Self::new(buffer)
    }
}

impl ScreenCapture {
    /// Wraps a captured buffer.
    #[must_use]
    pub fn new(buffer: PixelBuffer) -> Self {
        Self { buffer }
    }

    /// Returns the captured buffer.
    #[must_use]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Returns the color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the capture.
    #[must_use]
    #[track_caller]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        match self.buffer.get(x, y) {
            Some(color) => color,
            None => panic!(
                "pixel ({x}, {y}) is outside the {}x{} capture",
                self.buffer.width(),
                self.buffer.height()
            ),
        }
    }

    /// Checks that every pixel in `rect` is within `tolerance` of `color`.
    ///
    /// `rect` is rounded to whole pixels and must lie inside the capture.
    pub fn check_color(&self, rect: Rect, color: Rgba8, tolerance: u8) -> Result<(), CheckError> {
        let region = rect.round();
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let inside = region.x0 >= 0.0
            && region.y0 >= 0.0
            && region.x1 <= f64::from(width)
            && region.y1 <= f64::from(height);
        if !inside {
            return Err(CheckError::OutOfBounds {
                region,
                width,
                height,
            });
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "edges lie within the buffer dimensions"
        )]
        let edge = |v: f64| v as u32;
        for y in edge(region.y0)..edge(region.y1) {
            for x in edge(region.x0)..edge(region.x1) {
                self.check_pixel(x, y, color, tolerance)?;
            }
        }
        Ok(())
    }

    /// Checks one pixel.
    pub fn check_pixel(&self, x: u32, y: u32, color: Rgba8, tolerance: u8) -> Result<(), CheckError> {
        let Some(actual) = self.buffer.get(x, y) else {
            return Err(CheckError::OutOfBounds {
                region: Rect::new(f64::from(x), f64::from(y), f64::from(x) + 1.0, f64::from(y) + 1.0),
                width: self.buffer.width(),
                height: self.buffer.height(),
            });
        };
        if within(actual, color, tolerance) {
            Ok(())
        } else {
            Err(ColorMismatch {
                x,
                y,
                expected: color,
                actual,
                tolerance,
            }
            .into())
        }
    }

    /// Asserts that every pixel in `rect` is within `tolerance` of `color`.
    ///
    /// # Panics
    ///
    /// Panics with the first mismatching pixel, or if `rect` reaches outside
    /// the capture.
    #[track_caller]
    pub fn expect_color(&self, rect: Rect, color: Rgba8, tolerance: u8) {
        if let Err(mismatch) = self.check_color(rect, color, tolerance) {
            panic!("{mismatch}");
        }
    }

    /// Asserts that one pixel matches `color` exactly.
    ///
    /// # Panics
    ///
    /// Panics if the pixel differs.
    #[track_caller]
    pub fn expect_pixel(&self, x: u32, y: u32, color: Rgba8) {
        let actual = self.pixel(x, y);
        assert_eq!(actual, color, "pixel ({x}, {y}) mismatch");
    }

    /// Asserts that the one-pixel border just inside `rect` is `color`.
    ///
    /// # Panics
    ///
    /// Panics with the first mismatching pixel.
    #[track_caller]
    pub fn expect_border(&self, rect: Rect, color: Rgba8, tolerance: u8) {
        let r = rect.round();
        let edges = [
            Rect::new(r.x0, r.y0, r.x1, r.y0 + 1.0),
            Rect::new(r.x0, r.y1 - 1.0, r.x1, r.y1),
            Rect::new(r.x0, r.y0, r.x0 + 1.0, r.y1),
            Rect::new(r.x1 - 1.0, r.y0, r.x1, r.y1),
        ];
        for edge in edges {
            self.expect_color(edge, color, tolerance);
        }
    }
}

fn within(actual: Rgba8, expected: Rgba8, tolerance: u8) -> bool {
    actual
        .to_array()
        .into_iter()
        .zip(expected.to_array())
        .all(|(a, e)| a.abs_diff(e) <= tolerance)
}
