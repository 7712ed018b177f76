// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thread-safe layer composition service.
//!
//! [`SurfaceComposer`] wraps a [`LayerStore`](lamina_core::layer::LayerStore)
//! behind a commit lock and publishes an immutable
//! [`Snapshot`](lamina_core::snapshot::Snapshot) after every mutation.
//! Captures render the latest published snapshot through
//! [`lamina_render`] without blocking writers.
//!
//! ```
//! use kurbo::Rect;
//! use lamina_composer::{ComposerConfig, SurfaceComposer};
//! use lamina_core::buffer::Rgba8;
//! use lamina_core::layer::{LayerKind, Rgb};
//! use lamina_core::stack::LayerStack;
//!
//! let composer = SurfaceComposer::new(ComposerConfig::with_display(32, 32));
//! let layer = composer.create_layer("bg", LayerKind::Color, 32, 32, LayerStack(0));
//!
//! let mut txn = composer.begin();
//! txn.set_color(layer, Rgb::GREEN).set_position(layer, 16.0, 0.0);
//! txn.apply().unwrap();
//!
//! let pixels = composer.capture(LayerStack(0), Rect::new(0.0, 0.0, 32.0, 32.0));
//! assert_eq!(pixels.get(0, 0), Some(Rgba8::BLACK));
//! assert_eq!(pixels.get(16, 0), Some(Rgba8::GREEN));
//! ```
//!
//! # Logging
//!
//! Commits, rejections and layer lifecycle changes are logged with
//! [`tracing`]. Structured per-event diagnostics go to an optional
//! [`TraceSink`](lamina_core::trace::TraceSink) installed with
//! [`SurfaceComposer::set_trace_sink`].
//!
//! # Crate features
//!
//! - `trace`: delivers events to the installed trace sink.
//! - `trace-rich` (implies `trace`): also delivers per-layer change and
//!   paint-order events.

mod composer;
mod config;

pub use composer::{PendingTransaction, SurfaceComposer};
pub use config::ComposerConfig;
