// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types, layer registry and paint-order resolution for transactional
//! layer compositing.
//!
//! `lamina_core` provides the data structures behind a compositing service:
//! a registry of drawable layers, batched atomic mutations, immutable
//! snapshots, and the resolver that turns a snapshot into a back-to-front
//! paint order. It is `no_std` compatible (with `alloc`) and uses
//! struct-of-arrays storage with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   Transaction ──► LayerStore::commit() ──► Snapshot (one Generation)
//!                         │                       │
//!                         ▼                       ▼
//!                   LayerChanges          resolve() ──► PaintOrder
//!                                                           │
//!                                                           ▼
//!                                              compositor (lamina_render)
//! ```
//!
//! **[`layer`]**: Struct-of-arrays layer table with generational handles,
//! owned and mutated by [`LayerStore`](layer::LayerStore).
//!
//! **[`transaction`]**: Ordered batches of [`LayerOp`](transaction::LayerOp)s,
//! validated and applied as one unit.
//!
//! **[`snapshot`]**: Immutable, cheaply cloned views of one generation.
//!
//! **[`resolve`]**: Paint-order resolution (z, relative anchors,
//! negative-z children) and a per-generation cache.
//!
//! **[`geometry`]**: Accumulated translation, crop intersection and
//! rounded-corner coverage.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! GEOMETRY propagates to descendants; APPEARANCE and ORDER are local-only.
//!
//! **[`buffer`]**: RGBA8 pixel buffers for layer content and capture output.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! commit and capture instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   change and paint-order events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod buffer;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod resolve;
pub mod snapshot;
pub mod stack;
pub mod trace;
pub mod transaction;
