// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans and software compositing for lamina.
//!
//! This crate sits between [`lamina_core`]'s paint-order resolution and the
//! pixels a capture returns. It defines:
//!
//! - [`RenderPlan`]: the drawable subset of a [`PaintOrder`], one
//!   [`RenderItem`] per visible layer in back-to-front order.
//! - [`composite`]: a deterministic premultiplied source-over rasterizer
//!   that renders a plan into an RGBA8 [`PixelBuffer`].
//!
//! [`PaintOrder`]: lamina_core::resolve::PaintOrder
//! [`PixelBuffer`]: lamina_core::buffer::PixelBuffer

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod composite;
mod plan;

pub use composite::{PixelRect, composite};
pub use plan::{BlendMode, RenderItem, RenderPlan, Source};
