// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The thread-safe composer service.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use kurbo::Rect;
use lamina_core::buffer::PixelBuffer;
use lamina_core::error::{LayerError, TransactionError};
use lamina_core::layer::{LayerChanges, LayerId, LayerKind, LayerRecord, LayerStore};
use lamina_core::resolve::{PaintOrder, ResolverCache};
use lamina_core::snapshot::Snapshot;
use lamina_core::stack::{Generation, LayerStack};
use lamina_core::trace::{
    BufferSubmittedEvent, CaptureSummaryBuilder, CommitEvent, LayerCreatedEvent,
    LayerDestroyedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RejectEvent, TraceSink, Tracer,
};
use lamina_core::transaction::Transaction;
use lamina_render::{PixelRect, RenderPlan, composite};
use parking_lot::{Mutex, RwLock};

use crate::ComposerConfig;

/// Writer-side state, guarded by the commit lock.
#[derive(Debug)]
struct CommitState {
    store: LayerStore,
    /// Changes drained after the most recent mutation.
    changes: LayerChanges,
}

/// Owns the layer registry and serves captures.
///
/// All mutations (layer creation and destruction, buffer submission and
/// transaction commits) serialize through one commit lock. Each successful
/// mutation publishes a new [`Snapshot`] before the lock is released, so a
/// capture started after a mutation returns always observes it.
///
/// Captures clone the published snapshot and render without holding the
/// commit lock; they never block commits and never see a partial
/// transaction. Captures of the same generation share resolved paint orders
/// through a cache.
///
/// `SurfaceComposer` is `Send + Sync`; share it with an [`Arc`].
pub struct SurfaceComposer {
    config: ComposerConfig,
    state: Mutex<CommitState>,
    published: RwLock<Arc<Snapshot>>,
    cache: Mutex<ResolverCache>,
    sink: Mutex<Option<Box<dyn TraceSink + Send>>>,
    epoch: Instant,
}

impl core::fmt::Debug for SurfaceComposer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SurfaceComposer")
            .field("config", &self.config)
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Default for SurfaceComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl SurfaceComposer {
    /// Creates a composer with an empty registry.
    #[must_use]
    pub fn new(config: ComposerConfig) -> Self {
        let store = LayerStore::new();
        let snapshot = Arc::new(store.snapshot());
        Self {
            config,
            state: Mutex::new(CommitState {
                store,
                changes: LayerChanges::default(),
            }),
            published: RwLock::new(snapshot),
            cache: Mutex::new(ResolverCache::new()),
            sink: Mutex::new(None),
            epoch: Instant::now(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Installs a trace sink, replacing any previous one.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink + Send>) {
        *self.sink.lock() = Some(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink + Send>> {
        self.sink.lock().take()
    }

    /// Returns the most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.read())
    }

    /// Returns the generation of the most recently published snapshot.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.published.read().generation()
    }

    // -- Layers ---------------------------------------------------------------

    /// Creates a root layer on `layer_stack`.
    pub fn create_layer(
        &self,
        name: &str,
        kind: LayerKind,
        width: u32,
        height: u32,
        layer_stack: LayerStack,
    ) -> LayerId {
        let mut state = self.state.lock();
        let id = state
            .store
            .create_layer(name, kind, width, height, layer_stack);
        let generation = self.publish(&mut state);
        drop(state);

        tracing::debug!(?id, name, ?kind, width, height, "layer created");
        let timestamp_ns = self.now_ns();
        self.emit(|t| {
            t.layer_created(&LayerCreatedEvent {
                layer: id,
                kind,
                layer_stack,
                generation,
                timestamp_ns,
            });
        });
        id
    }

    /// Creates a root layer on the configured default layer stack.
    pub fn create_default_layer(
        &self,
        name: &str,
        kind: LayerKind,
        width: u32,
        height: u32,
    ) -> LayerId {
        self.create_layer(name, kind, width, height, self.config.default_layer_stack)
    }

    /// Destroys a layer. Its children become orphaned roots and layers
    /// anchored to it are excluded from paint order until re-anchored or
    /// reparented.
    pub fn destroy_layer(&self, id: LayerId) -> Result<Generation, LayerError> {
        let mut state = self.state.lock();
        state.store.destroy_layer(id)?;
        let generation = self.publish(&mut state);
        drop(state);

        tracing::debug!(?id, ?generation, "layer destroyed");
        let timestamp_ns = self.now_ns();
        self.emit(|t| {
            t.layer_destroyed(&LayerDestroyedEvent {
                layer: id,
                generation,
                timestamp_ns,
            });
        });
        Ok(generation)
    }

    /// Replaces the content of a buffer-backed layer.
    ///
    /// Texels are interpreted as premultiplied RGBA. The new content is
    /// visible to captures once this returns.
    pub fn submit_buffer_content(
        &self,
        id: LayerId,
        buffer: impl Into<Arc<PixelBuffer>>,
    ) -> Result<Generation, LayerError> {
        let buffer = buffer.into();
        let (width, height) = (buffer.width(), buffer.height());
        let mut state = self.state.lock();
        state.store.submit_buffer(id, buffer)?;
        let generation = self.publish(&mut state);
        drop(state);

        tracing::trace!(?id, width, height, "buffer submitted");
        let timestamp_ns = self.now_ns();
        self.emit(|t| {
            t.buffer_submitted(&BufferSubmittedEvent {
                layer: id,
                width,
                height,
                generation,
                timestamp_ns,
            });
        });
        Ok(generation)
    }

    /// Returns the committed state of a layer.
    pub fn get_layer(&self, id: LayerId) -> Result<LayerRecord, LayerError> {
        self.published.read().layer(id)
    }

    // -- Transactions ---------------------------------------------------------

    /// Starts a transaction that is applied through this composer.
    #[must_use]
    pub fn begin(&self) -> PendingTransaction<'_> {
        PendingTransaction {
            composer: self,
            txn: Transaction::new(),
        }
    }

    /// Applies `txn` atomically.
    ///
    /// On success the new generation is published before this returns. On
    /// error nothing is mutated and no generation is published.
    pub fn apply(&self, txn: &Transaction) -> Result<Generation, TransactionError> {
        let op_count = u32::try_from(txn.len()).unwrap_or(u32::MAX);
        let mut state = self.state.lock();
        let started_ns = self.now_ns();

        match state.store.commit(txn) {
            Ok(generation) => {
                self.publish(&mut state);
                let published_ns = self.now_ns();
                tracing::debug!(
                    ?generation,
                    op_count,
                    geometry = state.changes.geometry.len(),
                    appearance = state.changes.appearance.len(),
                    order = state.changes.order.len(),
                    "transaction committed"
                );
                #[cfg(feature = "trace-rich")]
                let changes = lamina_core::trace::LayerChange::from_changes(&state.changes);
                drop(state);

                self.emit(|t| {
                    t.commit(&CommitEvent {
                        generation,
                        op_count,
                        started_ns,
                        published_ns,
                    });
                    #[cfg(feature = "trace-rich")]
                    t.layer_changes(generation, &changes);
                });
                Ok(generation)
            }
            Err(error) => {
                let generation = state.store.generation();
                drop(state);

                tracing::warn!(%error, op_count, "transaction rejected");
                let timestamp_ns = self.now_ns();
                self.emit(|t| {
                    t.reject(&RejectEvent {
                        generation,
                        op_count,
                        error,
                        timestamp_ns,
                    });
                });
                Err(error)
            }
        }
    }

    // -- Capture --------------------------------------------------------------

    /// Renders `layer_stack` into a new buffer covering `region`.
    ///
    /// The region's edges are rounded to whole pixels. Pixels no layer
    /// covers are opaque black. Observes the last mutation that completed
    /// before the call.
    #[must_use]
    pub fn capture(&self, layer_stack: LayerStack, region: Rect) -> PixelBuffer {
        let snapshot = self.snapshot();
        let region = PixelRect::from_rect(region);
        let generation = snapshot.generation();
        let mut summary =
            CaptureSummaryBuilder::new(generation, layer_stack, region.width, region.height);

        self.begin_phase(&mut summary, generation, PhaseKind::Resolve);
        let (order, cache_hit) = self.paint_order(&snapshot, layer_stack);
        self.end_phase(&mut summary, generation, PhaseKind::Resolve);
        summary.set_entries(
            u32::try_from(order.entries().len()).unwrap_or(u32::MAX),
            cache_hit,
        );
        #[cfg(feature = "trace-rich")]
        {
            let layers: Vec<u32> = order.layers().map(LayerId::index).collect();
            self.emit(|t| t.paint_order(generation, &layers));
        }

        self.begin_phase(&mut summary, generation, PhaseKind::Composite);
        let plan = RenderPlan::build(&snapshot, &order);
        let (buffer, painted) = composite(&plan, region);
        self.end_phase(&mut summary, generation, PhaseKind::Composite);
        summary.set_painted(painted);

        let summary = summary.finish();
        tracing::trace!(
            ?generation,
            ?layer_stack,
            painted,
            cache_hit,
            "capture finished"
        );
        self.emit(|t| t.capture_summary(&summary));
        buffer
    }

    /// Renders `layer_stack` over the configured display rectangle.
    #[must_use]
    pub fn capture_display(&self, layer_stack: LayerStack) -> PixelBuffer {
        self.capture(layer_stack, self.config.display_rect())
    }

    // -- Internals ------------------------------------------------------------

    /// Publishes the store's current state. Must be called with the commit
    /// lock held.
    fn publish(&self, state: &mut CommitState) -> Generation {
        let CommitState { store, changes } = state;
        store.take_changes_into(changes);
        let snapshot = Arc::new(store.snapshot());
        let generation = snapshot.generation();
        *self.published.write() = snapshot;
        generation
    }

    /// Returns the paint order for `layer_stack` and whether it was cached.
    fn paint_order(&self, snapshot: &Snapshot, layer_stack: LayerStack) -> (Arc<PaintOrder>, bool) {
        let mut cache = self.cache.lock();
        match cache.get(snapshot.generation(), layer_stack) {
            Some(order) => (order, true),
            None => (cache.get_or_resolve(snapshot, layer_stack), false),
        }
    }

    fn begin_phase(
        &self,
        summary: &mut CaptureSummaryBuilder,
        generation: Generation,
        phase: PhaseKind,
    ) {
        let timestamp_ns = self.now_ns();
        summary.phase_begin(phase, timestamp_ns);
        self.emit(|t| {
            t.phase_begin(&PhaseBeginEvent {
                generation,
                phase,
                timestamp_ns,
            });
        });
    }

    fn end_phase(&self, summary: &mut CaptureSummaryBuilder, generation: Generation, phase: PhaseKind) {
        let timestamp_ns = self.now_ns();
        summary.phase_end(phase, timestamp_ns);
        self.emit(|t| {
            t.phase_end(&PhaseEndEvent {
                generation,
                phase,
                timestamp_ns,
            });
        });
    }

    fn emit(&self, f: impl FnOnce(&mut Tracer<'_>)) {
        let mut sink = self.sink.lock();
        if let Some(sink) = sink.as_deref_mut() {
            f(&mut Tracer::new(sink));
        }
    }

    fn now_ns(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A [`Transaction`] bound to the composer that will apply it.
///
/// Dereferences to [`Transaction`], so every setter is available directly.
/// Dropping it without calling [`apply`](Self::apply) discards the ops.
#[derive(Debug)]
pub struct PendingTransaction<'a> {
    composer: &'a SurfaceComposer,
    txn: Transaction,
}

impl PendingTransaction<'_> {
    /// Applies the batched ops atomically.
    pub fn apply(self) -> Result<Generation, TransactionError> {
        self.composer.apply(&self.txn)
    }

    /// Returns the batched ops without applying them.
    #[must_use]
    pub fn into_inner(self) -> Transaction {
        self.txn
    }
}

impl Deref for PendingTransaction<'_> {
    type Target = Transaction;

    fn deref(&self) -> &Transaction {
        &self.txn
    }
}

impl DerefMut for PendingTransaction<'_> {
    fn deref_mut(&mut self) -> &mut Transaction {
        &mut self.txn
    }
}
