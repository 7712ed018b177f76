// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Commits are complete (`X`) events on the writer track; capture phases are
//! begin/end pairs on the capture track.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedError, RecordedEvent, decode};

const WRITER_TID: u32 = 0;
const CAPTURE_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted from nanoseconds to microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Latest phase end per generation; summaries carry no timestamp.
    let mut last_capture_ns: HashMap<u64, u64> = HashMap::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::LayerCreated {
                layer,
                kind,
                layer_stack,
                generation,
                timestamp_ns,
            } => {
                events.push(instant(
                    "LayerCreated",
                    "Layer",
                    timestamp_ns,
                    json!({
                        "layer": layer.index,
                        "layer_generation": layer.generation,
                        "kind": format!("{kind:?}"),
                        "layer_stack": layer_stack.0,
                        "generation": generation.0,
                    }),
                ));
            }
            RecordedEvent::LayerDestroyed {
                layer,
                generation,
                timestamp_ns,
            } => {
                events.push(instant(
                    "LayerDestroyed",
                    "Layer",
                    timestamp_ns,
                    json!({
                        "layer": layer.index,
                        "layer_generation": layer.generation,
                        "generation": generation.0,
                    }),
                ));
            }
            RecordedEvent::BufferSubmitted {
                layer,
                width,
                height,
                generation,
                timestamp_ns,
            } => {
                events.push(instant(
                    "BufferSubmitted",
                    "Layer",
                    timestamp_ns,
                    json!({
                        "layer": layer.index,
                        "width": width,
                        "height": height,
                        "generation": generation.0,
                    }),
                ));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": "Commit",
                    "cat": "Transaction",
                    "ts": ns_to_us(e.started_ns),
                    "dur": ns_to_us(e.published_ns.saturating_sub(e.started_ns)),
                    "pid": 0,
                    "tid": WRITER_TID,
                    "args": {
                        "generation": e.generation.0,
                        "op_count": e.op_count,
                    }
                }));
            }
            RecordedEvent::Reject {
                generation,
                op_count,
                error,
                timestamp_ns,
            } => {
                events.push(instant(
                    "Reject",
                    "Transaction",
                    timestamp_ns,
                    json!({
                        "generation": generation.0,
                        "op_count": op_count,
                        "error": error_name(error),
                    }),
                ));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Capture",
                    "ts": ns_to_us(e.timestamp_ns),
                    "pid": 0,
                    "tid": CAPTURE_TID,
                    "args": {
                        "generation": e.generation.0,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_capture_ns.insert(e.generation.0, e.timestamp_ns);
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Capture",
                    "ts": ns_to_us(e.timestamp_ns),
                    "pid": 0,
                    "tid": CAPTURE_TID,
                    "args": {
                        "generation": e.generation.0,
                    }
                }));
            }
            RecordedEvent::CaptureSummary(s) => {
                let ts = last_capture_ns.get(&s.generation.0).copied().unwrap_or(0);
                events.push(json!({
                    "ph": "i",
                    "name": "CaptureSummary",
                    "cat": "Summary",
                    "ts": ns_to_us(ts),
                    "pid": 0,
                    "tid": CAPTURE_TID,
                    "s": "t",
                    "args": {
                        "generation": s.generation.0,
                        "layer_stack": s.layer_stack.0,
                        "width": s.width,
                        "height": s.height,
                        "entries": s.entries,
                        "painted": s.painted,
                        "cache_hit": s.cache_hit,
                        "resolve_us": ns_to_us(s.resolve_ns),
                        "composite_us": ns_to_us(s.composite_ns),
                    }
                }));
            }
            RecordedEvent::LayerChangesCount { generation, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayerChanges",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": WRITER_TID,
                    "s": "p",
                    "args": {
                        "generation": generation.0,
                        "count": count,
                    }
                }));
            }
            RecordedEvent::PaintOrderCount { generation, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "PaintOrder",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": CAPTURE_TID,
                    "s": "p",
                    "args": {
                        "generation": generation.0,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, timestamp_ns: u64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ns_to_us(timestamp_ns),
        "pid": 0,
        "tid": WRITER_TID,
        "s": "t",
        "args": args,
    })
}

fn error_name(error: RecordedError) -> String {
    match error {
        RecordedError::InvalidHandle(layer) => {
            format!("InvalidHandle(#{}.{})", layer.index, layer.generation)
        }
        RecordedError::CycleDetected { layer, target } => format!(
            "CycleDetected(#{}.{} -> #{}.{})",
            layer.index, layer.generation, target.index, target.generation
        ),
    }
}

fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}
