// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composer configuration.

use kurbo::Rect;
use lamina_core::stack::LayerStack;

/// Configuration for a [`SurfaceComposer`](crate::SurfaceComposer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Width of the display in pixels.
    pub display_width: u32,
    /// Height of the display in pixels.
    pub display_height: u32,
    /// Layer stack used when a layer is created without an explicit one.
    pub default_layer_stack: LayerStack,
}

impl ComposerConfig {
    /// A 1920x1080 display on layer stack 0.
    #[must_use]
    pub const fn full_hd() -> Self {
        Self::with_display(1920, 1080)
    }

    /// A display of the given size on layer stack 0.
    #[must_use]
    pub const fn with_display(width: u32, height: u32) -> Self {
        Self {
            display_width: width,
            display_height: height,
            default_layer_stack: LayerStack(0),
        }
    }

    /// Returns a copy with a different default layer stack.
    #[must_use]
    pub const fn default_layer_stack(mut self, layer_stack: LayerStack) -> Self {
        self.default_layer_stack = layer_stack;
        self
    }

    /// The display rectangle, anchored at the origin.
    #[must_use]
    pub fn display_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.display_width),
            f64::from(self.display_height),
        )
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::full_hd()
    }
}
