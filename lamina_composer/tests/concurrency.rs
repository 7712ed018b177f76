// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Captures racing commits, and trace delivery.

use std::sync::{Arc, Mutex};
use std::thread;

use lamina_composer::{ComposerConfig, SurfaceComposer};
use lamina_core::buffer::Rgba8;
use lamina_core::layer::{LayerKind, Rgb};
use lamina_core::stack::LayerStack;
use lamina_core::trace::{CaptureSummary, CommitEvent, RejectEvent, TraceSink};
use lamina_core::transaction::Transaction;

const STACK: LayerStack = LayerStack(0);

#[test]
fn captures_never_observe_partial_transactions() {
    let composer = Arc::new(SurfaceComposer::new(ComposerConfig::with_display(16, 8)));
    let left = composer.create_layer("left", LayerKind::Color, 8, 8, STACK);
    let right = composer.create_layer("right", LayerKind::Color, 8, 8, STACK);
    let mut txn = Transaction::new();
    txn.set_color(left, Rgb::RED)
        .set_color(right, Rgb::RED)
        .set_position(right, 8.0, 0.0);
    composer.apply(&txn).unwrap();

    thread::scope(|scope| {
        let writer = Arc::clone(&composer);
        scope.spawn(move || {
            for i in 0..200 {
                let color = if i % 2 == 0 { Rgb::BLUE } else { Rgb::RED };
                let mut txn = writer.begin();
                txn.set_color(left, color).set_color(right, color);
                txn.apply().unwrap();
            }
        });

        for _ in 0..4 {
            let reader = Arc::clone(&composer);
            scope.spawn(move || {
                for _ in 0..100 {
                    let shot = reader.capture_display(STACK);
                    let (l, r) = (shot.get(0, 0), shot.get(15, 7));
                    assert_eq!(l, r, "capture mixed two generations");
                    assert!(
                        l == Some(Rgba8::RED) || l == Some(Rgba8::BLUE),
                        "unexpected color {l:?}"
                    );
                }
            });
        }
    });
}

#[test]
fn capture_after_apply_observes_it() {
    let composer = Arc::new(SurfaceComposer::new(ComposerConfig::with_display(4, 4)));
    let layer = composer.create_layer("l", LayerKind::Color, 4, 4, STACK);

    thread::scope(|scope| {
        for i in 0..8_u8 {
            let composer = Arc::clone(&composer);
            scope.spawn(move || {
                let mut txn = Transaction::new();
                let r = f32::from(i) / 7.0;
                txn.set_color(layer, Rgb::new(r, 0.0, 0.0));
                let generation = composer.apply(&txn).unwrap();
                assert!(composer.snapshot().generation() >= generation);
            });
        }
    });

    let mut txn = composer.begin();
    txn.set_color(layer, Rgb::GREEN);
    txn.apply().unwrap();
    assert_eq!(composer.capture_display(STACK).get(2, 2), Some(Rgba8::GREEN));
}

#[test]
fn generations_are_strictly_increasing() {
    let composer = Arc::new(SurfaceComposer::default());
    let layer = composer.create_default_layer("l", LayerKind::Color, 4, 4);
    let seen = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for z in 0..25 {
                    let mut txn = composer.begin();
                    txn.set_z(layer, z);
                    let generation = txn.apply().unwrap();
                    seen.lock().unwrap().push(generation);
                }
            });
        }
    });

    let mut seen = seen.into_inner().unwrap();
    let count = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), count, "two commits shared a generation");
}

#[derive(Default)]
struct Counts {
    commits: Vec<CommitEvent>,
    rejects: Vec<RejectEvent>,
    captures: Vec<CaptureSummary>,
}

struct SharedSink(Arc<Mutex<Counts>>);

impl TraceSink for SharedSink {
    fn on_commit(&mut self, e: &CommitEvent) {
        self.0.lock().unwrap().commits.push(*e);
    }

    fn on_reject(&mut self, e: &RejectEvent) {
        self.0.lock().unwrap().rejects.push(*e);
    }

    fn on_capture_summary(&mut self, s: &CaptureSummary) {
        self.0.lock().unwrap().captures.push(*s);
    }
}

#[test]
fn trace_sink_receives_events() {
    let counts = Arc::new(Mutex::new(Counts::default()));
    let composer = SurfaceComposer::new(ComposerConfig::with_display(8, 8));
    composer.set_trace_sink(Box::new(SharedSink(Arc::clone(&counts))));

    let a = composer.create_layer("a", LayerKind::Color, 8, 8, STACK);
    let b = composer.create_layer("b", LayerKind::Color, 8, 8, STACK);
    let mut txn = composer.begin();
    txn.set_color(a, Rgb::RED).set_z(b, -1);
    let generation = txn.apply().unwrap();

    composer.destroy_layer(b).unwrap();
    let mut txn = composer.begin();
    txn.set_z(b, 2);
    assert!(txn.apply().is_err());

    let _ = composer.capture_display(STACK);
    let _ = composer.capture_display(STACK);

    let counts = counts.lock().unwrap();
    assert_eq!(counts.commits.len(), 1);
    assert_eq!(counts.commits[0].generation, generation);
    assert_eq!(counts.commits[0].op_count, 2);
    assert!(counts.commits[0].published_ns >= counts.commits[0].started_ns);
    assert_eq!(counts.rejects.len(), 1);
    assert_eq!(counts.rejects[0].op_count, 1);

    assert_eq!(counts.captures.len(), 2);
    assert!(!counts.captures[0].cache_hit);
    assert!(counts.captures[1].cache_hit);
    assert_eq!(counts.captures[1].painted, 1);
    assert_eq!(counts.captures[1].entries, 1);
}
