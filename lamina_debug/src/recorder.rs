// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Layer handles are recorded as raw `(index, generation)` pairs
//! ([`RawLayerId`]); they identify a layer in logs but are not live handles.
//!
//! Rich events ([`on_layer_changes`](TraceSink::on_layer_changes),
//! [`on_paint_order`](TraceSink::on_paint_order)) store only the count.

use lamina_core::error::TransactionError;
use lamina_core::layer::{LayerId, LayerKind};
use lamina_core::stack::{Generation, LayerStack};
use lamina_core::trace::{
    BufferSubmittedEvent, CaptureSummary, CommitEvent, LayerChange, LayerCreatedEvent,
    LayerDestroyedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RejectEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LAYER_CREATED: u8 = 1;
const TAG_LAYER_DESTROYED: u8 = 2;
const TAG_BUFFER_SUBMITTED: u8 = 3;
const TAG_COMMIT: u8 = 4;
const TAG_REJECT: u8 = 5;
const TAG_PHASE_BEGIN: u8 = 6;
const TAG_PHASE_END: u8 = 7;
const TAG_CAPTURE_SUMMARY: u8 = 8;
const TAG_LAYER_CHANGES_COUNT: u8 = 9;
const TAG_PAINT_ORDER_COUNT: u8 = 10;

const ERROR_INVALID_HANDLE: u8 = 0;
const ERROR_CYCLE: u8 = 1;

// ---------------------------------------------------------------------------
// Recorded value types
// ---------------------------------------------------------------------------

/// A layer handle as written to a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawLayerId {
    /// Slot index.
    pub index: u32,
    /// Slot generation.
    pub generation: u32,
}

impl From<LayerId> for RawLayerId {
    fn from(id: LayerId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A [`TransactionError`] as written to a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedError {
    /// See [`TransactionError::InvalidHandle`].
    InvalidHandle(RawLayerId),
    /// See [`TransactionError::CycleDetected`].
    CycleDetected {
        /// The layer being linked.
        layer: RawLayerId,
        /// The requested parent or anchor target.
        target: RawLayerId,
    },
}

impl From<TransactionError> for RecordedError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::InvalidHandle(id) => Self::InvalidHandle(id.into()),
            TransactionError::CycleDetected { layer, target } => Self::CycleDetected {
                layer: layer.into(),
                target: target.into(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    fn write_layer(&mut self, id: RawLayerId) {
        self.write_u32(id.index);
        self.write_u32(id.generation);
    }

    fn write_kind(&mut self, kind: LayerKind) {
        self.write_u8(match kind {
            LayerKind::BufferQueue => 0,
            LayerKind::BufferState => 1,
            LayerKind::Color => 2,
            LayerKind::Container => 3,
        });
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Resolve => 0,
            PhaseKind::Composite => 1,
        });
    }

    fn write_error(&mut self, err: RecordedError) {
        match err {
            RecordedError::InvalidHandle(id) => {
                self.write_u8(ERROR_INVALID_HANDLE);
                self.write_layer(id);
                self.write_layer(id);
            }
            RecordedError::CycleDetected { layer, target } => {
                self.write_u8(ERROR_CYCLE);
                self.write_layer(layer);
                self.write_layer(target);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_layer_created(&mut self, e: &LayerCreatedEvent) {
        self.write_u8(TAG_LAYER_CREATED);
        self.write_layer(e.layer.into());
        self.write_kind(e.kind);
        self.write_u32(e.layer_stack.0);
        self.write_u64(e.generation.0);
        self.write_u64(e.timestamp_ns);
    }

    fn on_layer_destroyed(&mut self, e: &LayerDestroyedEvent) {
        self.write_u8(TAG_LAYER_DESTROYED);
        self.write_layer(e.layer.into());
        self.write_u64(e.generation.0);
        self.write_u64(e.timestamp_ns);
    }

    fn on_buffer_submitted(&mut self, e: &BufferSubmittedEvent) {
        self.write_u8(TAG_BUFFER_SUBMITTED);
        self.write_layer(e.layer.into());
        self.write_u32(e.width);
        self.write_u32(e.height);
        self.write_u64(e.generation.0);
        self.write_u64(e.timestamp_ns);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.generation.0);
        self.write_u32(e.op_count);
        self.write_u64(e.started_ns);
        self.write_u64(e.published_ns);
    }

    fn on_reject(&mut self, e: &RejectEvent) {
        self.write_u8(TAG_REJECT);
        self.write_u64(e.generation.0);
        self.write_u32(e.op_count);
        self.write_error(e.error.into());
        self.write_u64(e.timestamp_ns);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.generation.0);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp_ns);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.generation.0);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp_ns);
    }

    fn on_capture_summary(&mut self, s: &CaptureSummary) {
        self.write_u8(TAG_CAPTURE_SUMMARY);
        self.write_u64(s.generation.0);
        self.write_u32(s.layer_stack.0);
        self.write_u32(s.width);
        self.write_u32(s.height);
        self.write_u32(s.entries);
        self.write_u32(s.painted);
        self.write_u8(u8::from(s.cache_hit));
        self.write_u64(s.resolve_ns);
        self.write_u64(s.composite_ns);
    }

    fn on_layer_changes(&mut self, generation: Generation, changes: &[LayerChange]) {
        self.write_u8(TAG_LAYER_CHANGES_COUNT);
        self.write_u64(generation.0);
        self.write_count(changes.len());
    }

    fn on_paint_order(&mut self, generation: Generation, layers: &[u32]) {
        self.write_u8(TAG_PAINT_ORDER_COUNT);
        self.write_u64(generation.0);
        self.write_count(layers.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`LayerCreatedEvent`].
    LayerCreated {
        /// The new layer.
        layer: RawLayerId,
        /// What it draws.
        kind: LayerKind,
        /// Its initial layer stack.
        layer_stack: LayerStack,
        /// Generation published by the creation.
        generation: Generation,
        /// When the layer was created.
        timestamp_ns: u64,
    },
    /// A [`LayerDestroyedEvent`].
    LayerDestroyed {
        /// The destroyed layer.
        layer: RawLayerId,
        /// Generation published by the destruction.
        generation: Generation,
        /// When the layer was destroyed.
        timestamp_ns: u64,
    },
    /// A [`BufferSubmittedEvent`].
    BufferSubmitted {
        /// The receiving layer.
        layer: RawLayerId,
        /// Buffer width in texels.
        width: u32,
        /// Buffer height in texels.
        height: u32,
        /// Generation published by the submission.
        generation: Generation,
        /// When the buffer was submitted.
        timestamp_ns: u64,
    },
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`RejectEvent`].
    Reject {
        /// Generation that stayed current.
        generation: Generation,
        /// Number of ops in the transaction.
        op_count: u32,
        /// Why it was rejected.
        error: RecordedError,
        /// When the rejection happened.
        timestamp_ns: u64,
    },
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CaptureSummary`].
    CaptureSummary(CaptureSummary),
    /// Layer-change count for a commit.
    LayerChangesCount {
        /// Generation the changes were committed in.
        generation: Generation,
        /// Number of layer changes.
        count: u32,
    },
    /// Paint-order length for a capture.
    PaintOrderCount {
        /// Generation that was resolved.
        generation: Generation,
        /// Number of layers in the order.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_generation(&mut self) -> Option<Generation> {
        self.read_u64().map(Generation)
    }

    fn read_layer(&mut self) -> Option<RawLayerId> {
        Some(RawLayerId {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_kind(&mut self) -> Option<LayerKind> {
        Some(match self.read_u8()? {
            0 => LayerKind::BufferQueue,
            1 => LayerKind::BufferState,
            2 => LayerKind::Color,
            _ => LayerKind::Container,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Resolve,
            _ => PhaseKind::Composite,
        })
    }

    fn read_error(&mut self) -> Option<RecordedError> {
        let code = self.read_u8()?;
        let layer = self.read_layer()?;
        let target = self.read_layer()?;
        Some(match code {
            ERROR_INVALID_HANDLE => RecordedError::InvalidHandle(layer),
            _ => RecordedError::CycleDetected { layer, target },
        })
    }

    fn decode_layer_created(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayerCreated {
            layer: self.read_layer()?,
            kind: self.read_kind()?,
            layer_stack: LayerStack(self.read_u32()?),
            generation: self.read_generation()?,
            timestamp_ns: self.read_u64()?,
        })
    }

    fn decode_layer_destroyed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayerDestroyed {
            layer: self.read_layer()?,
            generation: self.read_generation()?,
            timestamp_ns: self.read_u64()?,
        })
    }

    fn decode_buffer_submitted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BufferSubmitted {
            layer: self.read_layer()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
            generation: self.read_generation()?,
            timestamp_ns: self.read_u64()?,
        })
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            generation: self.read_generation()?,
            op_count: self.read_u32()?,
            started_ns: self.read_u64()?,
            published_ns: self.read_u64()?,
        }))
    }

    fn decode_reject(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reject {
            generation: self.read_generation()?,
            op_count: self.read_u32()?,
            error: self.read_error()?,
            timestamp_ns: self.read_u64()?,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            generation: self.read_generation()?,
            phase: self.read_phase()?,
            timestamp_ns: self.read_u64()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            generation: self.read_generation()?,
            phase: self.read_phase()?,
            timestamp_ns: self.read_u64()?,
        }))
    }

    fn decode_capture_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CaptureSummary(CaptureSummary {
            generation: self.read_generation()?,
            layer_stack: LayerStack(self.read_u32()?),
            width: self.read_u32()?,
            height: self.read_u32()?,
            entries: self.read_u32()?,
            painted: self.read_u32()?,
            cache_hit: self.read_u8()? != 0,
            resolve_ns: self.read_u64()?,
            composite_ns: self.read_u64()?,
        }))
    }

    fn decode_count(&mut self) -> Option<(Generation, u32)> {
        Some((self.read_generation()?, self.read_u32()?))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LAYER_CREATED => self.decode_layer_created(),
            TAG_LAYER_DESTROYED => self.decode_layer_destroyed(),
            TAG_BUFFER_SUBMITTED => self.decode_buffer_submitted(),
            TAG_COMMIT => self.decode_commit(),
            TAG_REJECT => self.decode_reject(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_CAPTURE_SUMMARY => self.decode_capture_summary(),
            TAG_LAYER_CHANGES_COUNT => {
                let (generation, count) = self.decode_count()?;
                Some(RecordedEvent::LayerChangesCount { generation, count })
            }
            TAG_PAINT_ORDER_COUNT => {
                let (generation, count) = self.decode_count()?;
                Some(RecordedEvent::PaintOrderCount { generation, count })
            }
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
