// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for commits and composite passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! composer calls at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`CaptureSummaryBuilder`] collects phase timestamps during a capture and
//! produces a [`CaptureSummary`] at the end.
//!
//! Timestamps are nanoseconds on a monotonic clock chosen by the emitter;
//! only differences between them are meaningful.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`LayerChange`] and paint-order
//!   events plus the corresponding `TraceSink` methods.

#[cfg(feature = "trace-rich")]
use alloc::vec::Vec;

use crate::error::TransactionError;
use crate::layer::{LayerId, LayerKind};
use crate::stack::{Generation, LayerStack};

#[cfg(feature = "trace-rich")]
use crate::layer::LayerChanges;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a capture is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Paint-order resolution (or cache lookup).
    Resolve,
    /// Blending into the destination buffer.
    Composite,
}

/// Which category of a layer changed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerField {
    /// Translation, crop, corner radius or parent.
    Geometry,
    /// Alpha, flags, color or content.
    Appearance,
    /// Z, relative anchor or layer stack.
    Order,
    /// The layer was created.
    Added,
    /// The layer was destroyed.
    Removed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a layer is created.
#[derive(Clone, Copy, Debug)]
pub struct LayerCreatedEvent {
    /// The new layer.
    pub layer: LayerId,
    /// What it draws.
    pub kind: LayerKind,
    /// Its initial layer stack.
    pub layer_stack: LayerStack,
    /// Generation published by the creation.
    pub generation: Generation,
    /// When the layer was created.
    pub timestamp_ns: u64,
}

/// Emitted when a layer is destroyed.
#[derive(Clone, Copy, Debug)]
pub struct LayerDestroyedEvent {
    /// The destroyed layer.
    pub layer: LayerId,
    /// Generation published by the destruction.
    pub generation: Generation,
    /// When the layer was destroyed.
    pub timestamp_ns: u64,
}

/// Emitted when buffer content is submitted to a layer.
#[derive(Clone, Copy, Debug)]
pub struct BufferSubmittedEvent {
    /// The receiving layer.
    pub layer: LayerId,
    /// Buffer width in texels.
    pub width: u32,
    /// Buffer height in texels.
    pub height: u32,
    /// Generation published by the submission.
    pub generation: Generation,
    /// When the buffer was submitted.
    pub timestamp_ns: u64,
}

/// Emitted after a transaction is committed.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Generation published by the commit.
    pub generation: Generation,
    /// Number of ops in the transaction.
    pub op_count: u32,
    /// When the commit lock was acquired.
    pub started_ns: u64,
    /// When the new snapshot was published.
    pub published_ns: u64,
}

/// Emitted when a transaction is rejected.
#[derive(Clone, Copy, Debug)]
pub struct RejectEvent {
    /// Generation that stays current.
    pub generation: Generation,
    /// Number of ops in the transaction.
    pub op_count: u32,
    /// Why it was rejected.
    pub error: TransactionError,
    /// When the rejection happened.
    pub timestamp_ns: u64,
}

/// Marks the beginning of a capture phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Generation being captured.
    pub generation: Generation,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Time at the start of the phase.
    pub timestamp_ns: u64,
}

/// Marks the end of a capture phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Generation being captured.
    pub generation: Generation,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Time at the end of the phase.
    pub timestamp_ns: u64,
}

/// Per-capture summary produced by [`CaptureSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct CaptureSummary {
    /// Generation that was captured.
    pub generation: Generation,
    /// Layer stack that was captured.
    pub layer_stack: LayerStack,
    /// Capture width in pixels.
    pub width: u32,
    /// Capture height in pixels.
    pub height: u32,
    /// Entries in the resolved paint order.
    pub entries: u32,
    /// Entries that contributed pixels.
    pub painted: u32,
    /// Whether the paint order came from the cache.
    pub cache_hit: bool,
    /// Resolve phase duration in nanoseconds (0 if not measured).
    pub resolve_ns: u64,
    /// Composite phase duration in nanoseconds (0 if not measured).
    pub composite_ns: u64,
}

/// A per-commit layer change record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerChange {
    /// Index of the layer that changed.
    pub layer_index: u32,
    /// Which category changed.
    pub field: LayerField,
}

#[cfg(feature = "trace-rich")]
impl LayerChange {
    /// Flattens drained [`LayerChanges`] into one record per (layer, field).
    #[must_use]
    pub fn from_changes(changes: &LayerChanges) -> Vec<Self> {
        let lists = [
            (&changes.added, LayerField::Added),
            (&changes.removed, LayerField::Removed),
            (&changes.geometry, LayerField::Geometry),
            (&changes.appearance, LayerField::Appearance),
            (&changes.order, LayerField::Order),
        ];
        lists
            .into_iter()
            .flat_map(|(indices, field)| {
                indices.iter().map(move |&layer_index| Self { layer_index, field })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the composer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a layer is created.
    fn on_layer_created(&mut self, e: &LayerCreatedEvent) {
        _ = e;
    }

    /// Called when a layer is destroyed.
    fn on_layer_destroyed(&mut self, e: &LayerDestroyedEvent) {
        _ = e;
    }

    /// Called when buffer content is submitted.
    fn on_buffer_submitted(&mut self, e: &BufferSubmittedEvent) {
        _ = e;
    }

    /// Called after a transaction is committed.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a transaction is rejected.
    fn on_reject(&mut self, e: &RejectEvent) {
        _ = e;
    }

    /// Called at the beginning of a capture phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a capture phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called with a per-capture summary.
    fn on_capture_summary(&mut self, s: &CaptureSummary) {
        _ = s;
    }

    /// Called with the layers a commit touched (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_layer_changes(&mut self, generation: Generation, changes: &[LayerChange]) {
        _ = (generation, changes);
    }

    /// Called with the resolved paint order of a capture, as raw slot
    /// indices back to front (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_paint_order(&mut self, generation: Generation, layers: &[u32]) {
        _ = (generation, layers);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Expands to a `Tracer` method that forwards one event to the sink.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident => $hook:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`LayerCreatedEvent`].
        layer_created => on_layer_created(LayerCreatedEvent)
    );
    forward!(
        /// Emits a [`LayerDestroyedEvent`].
        layer_destroyed => on_layer_destroyed(LayerDestroyedEvent)
    );
    forward!(
        /// Emits a [`BufferSubmittedEvent`].
        buffer_submitted => on_buffer_submitted(BufferSubmittedEvent)
    );
    forward!(
        /// Emits a [`CommitEvent`].
        commit => on_commit(CommitEvent)
    );
    forward!(
        /// Emits a [`RejectEvent`].
        reject => on_reject(RejectEvent)
    );
    forward!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin => on_phase_begin(PhaseBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseEndEvent`].
        phase_end => on_phase_end(PhaseEndEvent)
    );
    forward!(
        /// Emits a [`CaptureSummary`].
        capture_summary => on_capture_summary(CaptureSummary)
    );

    /// Emits layer changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn layer_changes(&mut self, generation: Generation, changes: &[LayerChange]) {
        if let Some(s) = &mut self.sink {
            s.on_layer_changes(generation, changes);
        }
    }

    /// Emits a resolved paint order (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn paint_order(&mut self, generation: Generation, layers: &[u32]) {
        if let Some(s) = &mut self.sink {
            s.on_paint_order(generation, layers);
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a capture and produces a
/// [`CaptureSummary`].
#[derive(Debug)]
pub struct CaptureSummaryBuilder {
    summary: CaptureSummary,
    phase_starts: [Option<u64>; 2],
    phase_ends: [Option<u64>; 2],
}

impl CaptureSummaryBuilder {
    /// Starts building a summary for a capture of `layer_stack` at
    /// `generation` into a `width` x `height` region.
    #[must_use]
    pub fn new(generation: Generation, layer_stack: LayerStack, width: u32, height: u32) -> Self {
        Self {
            summary: CaptureSummary {
                generation,
                layer_stack,
                width,
                height,
                entries: 0,
                painted: 0,
                cache_hit: false,
                resolve_ns: 0,
                composite_ns: 0,
            },
            phase_starts: [None; 2],
            phase_ends: [None; 2],
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: u64) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: u64) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records the size of the resolved order and whether it was cached.
    pub fn set_entries(&mut self, entries: u32, cache_hit: bool) {
        self.summary.entries = entries;
        self.summary.cache_hit = cache_hit;
    }

    /// Records how many entries contributed pixels.
    pub fn set_painted(&mut self, painted: u32) {
        self.summary.painted = painted;
    }

    /// Consumes the builder and produces the final [`CaptureSummary`].
    #[must_use]
    pub fn finish(self) -> CaptureSummary {
        CaptureSummary {
            resolve_ns: self.phase_duration(PhaseKind::Resolve),
            composite_ns: self.phase_duration(PhaseKind::Composite),
            ..self.summary
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Resolve => 0,
        PhaseKind::Composite => 1,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerStore;

    fn sample_commit() -> CommitEvent {
        CommitEvent {
            generation: Generation(7),
            op_count: 3,
            started_ns: 1_000,
            published_ns: 1_250,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_commit(&sample_commit());
        sink.on_capture_summary(
            &CaptureSummaryBuilder::new(Generation(1), LayerStack(0), 4, 4).finish(),
        );
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.commit(&sample_commit());
        tracer.phase_begin(&PhaseBeginEvent {
            generation: Generation(7),
            phase: PhaseKind::Resolve,
            timestamp_ns: 0,
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = CaptureSummaryBuilder::new(Generation(9), LayerStack(2), 64, 32);
        builder.phase_begin(PhaseKind::Resolve, 1_000);
        builder.phase_end(PhaseKind::Resolve, 1_400);
        builder.phase_begin(PhaseKind::Composite, 1_400);
        builder.phase_end(PhaseKind::Composite, 3_000);
        builder.set_entries(5, true);
        builder.set_painted(3);

        let summary = builder.finish();
        assert_eq!(summary.resolve_ns, 400);
        assert_eq!(summary.composite_ns, 1_600);
        assert_eq!(summary.entries, 5);
        assert_eq!(summary.painted, 3);
        assert!(summary.cache_hit);
        assert_eq!(summary.layer_stack, LayerStack(2));
        assert_eq!((summary.width, summary.height), (64, 32));
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let summary = CaptureSummaryBuilder::new(Generation(1), LayerStack(0), 1, 1).finish();
        assert_eq!(summary.resolve_ns, 0);
        assert_eq!(summary.composite_ns, 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            generations: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_commit(&mut self, e: &CommitEvent) {
                self.generations.push(e.generation.0);
            }
        }

        let mut sink = RecordingSink {
            generations: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.commit(&sample_commit());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.generations, &[7]);
    }

    #[cfg(feature = "trace-rich")]
    #[test]
    fn layer_changes_flatten_per_field() {
        use crate::transaction::Transaction;

        let mut store = LayerStore::new();
        let id = store.create_layer("a", LayerKind::Color, 4, 4, LayerStack(0));
        let mut txn = Transaction::new();
        txn.set_alpha(id, 0.5);
        store.commit(&txn).unwrap();

        let flat = LayerChange::from_changes(&store.take_changes());
        assert!(flat.contains(&LayerChange {
            layer_index: id.index(),
            field: LayerField::Added,
        }));
        assert!(flat.contains(&LayerChange {
            layer_index: id.index(),
            field: LayerField::Appearance,
        }));
    }

    #[test]
    fn reject_event_carries_error() {
        let mut store = LayerStore::new();
        let id = store.create_layer("a", LayerKind::Container, 0, 0, LayerStack(0));
        let e = RejectEvent {
            generation: store.generation(),
            op_count: 1,
            error: TransactionError::InvalidHandle(id),
            timestamp_ns: 5,
        };
        assert_eq!(e.error, TransactionError::InvalidHandle(id));
    }
}
