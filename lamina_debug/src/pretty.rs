// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use lamina_core::stack::Generation;
use lamina_core::trace::{
    BufferSubmittedEvent, CaptureSummary, CommitEvent, LayerChange, LayerCreatedEvent,
    LayerDestroyedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RejectEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Resolve => "resolve",
        PhaseKind::Composite => "composite",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_layer_created(&mut self, e: &LayerCreatedEvent) {
        let _ = writeln!(
            self.writer,
            "[layer:create] {} kind={:?} stack={} gen={} at {:.1}µs",
            e.layer,
            e.kind,
            e.layer_stack.0,
            e.generation.0,
            us(e.timestamp_ns),
        );
    }

    fn on_layer_destroyed(&mut self, e: &LayerDestroyedEvent) {
        let _ = writeln!(
            self.writer,
            "[layer:destroy] {} gen={} at {:.1}µs",
            e.layer,
            e.generation.0,
            us(e.timestamp_ns),
        );
    }

    fn on_buffer_submitted(&mut self, e: &BufferSubmittedEvent) {
        let _ = writeln!(
            self.writer,
            "[buffer] {} {}x{} gen={} at {:.1}µs",
            e.layer,
            e.width,
            e.height,
            e.generation.0,
            us(e.timestamp_ns),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] gen={} ops={} took={:.1}µs",
            e.generation.0,
            e.op_count,
            us(e.published_ns.saturating_sub(e.started_ns)),
        );
    }

    fn on_reject(&mut self, e: &RejectEvent) {
        let _ = writeln!(
            self.writer,
            "[reject] gen={} ops={} error=\"{}\"",
            e.generation.0, e.op_count, e.error,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] gen={} {} at {:.1}µs",
            e.generation.0,
            phase_name(e.phase),
            us(e.timestamp_ns),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] gen={} {} at {:.1}µs",
            e.generation.0,
            phase_name(e.phase),
            us(e.timestamp_ns),
        );
    }

    fn on_capture_summary(&mut self, s: &CaptureSummary) {
        let cache = if s.cache_hit { "hit" } else { "miss" };
        let _ = writeln!(
            self.writer,
            "[capture] gen={} stack={} {}x{} entries={} painted={} cache={cache} \
             resolve={:.1}µs composite={:.1}µs",
            s.generation.0,
            s.layer_stack.0,
            s.width,
            s.height,
            s.entries,
            s.painted,
            us(s.resolve_ns),
            us(s.composite_ns),
        );
    }

    fn on_layer_changes(&mut self, generation: Generation, changes: &[LayerChange]) {
        let _ = writeln!(
            self.writer,
            "[layers] gen={} changes={}",
            generation.0,
            changes.len(),
        );
    }

    fn on_paint_order(&mut self, generation: Generation, layers: &[u32]) {
        let _ = writeln!(
            self.writer,
            "[order] gen={} layers={layers:?}",
            generation.0,
        );
    }
}
