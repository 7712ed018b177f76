// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable layer registry.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, LayerId};
use super::props::LayerKind;
use super::table::LayerTable;
use crate::buffer::PixelBuffer;
use crate::dirty;
use crate::error::{LayerError, TransactionError};
use crate::snapshot::Snapshot;
use crate::stack::{Generation, LayerStack};
use crate::transaction::{LayerOp, Transaction};

/// Owns the layer table and applies every mutation to it.
///
/// The table lives behind an `Arc` and is copied on write, so a
/// [`Snapshot`] taken before a mutation keeps observing the old state. Every
/// successful mutation (layer creation or destruction, buffer submission,
/// transaction commit) advances the [`Generation`].
///
/// Read access to the current state goes through [`Deref`] to
/// [`LayerTable`].
#[derive(Debug)]
pub struct LayerStore {
    table: Arc<LayerTable>,
    generation: Generation,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for LayerStore {
    type Target = LayerTable;

    fn deref(&self) -> &LayerTable {
        &self.table
    }
}

impl LayerStore {
    /// Creates an empty store at [`Generation::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(LayerTable::default()),
            generation: Generation::INITIAL,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    /// Returns the generation of the current state.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns an immutable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.generation, Arc::clone(&self.table))
    }

    // -- Lifecycle --

    /// Creates a root layer and returns its handle.
    ///
    /// The layer starts with alpha 1, no flags, `z` 0, position `(0, 0)`, no
    /// crop, no corner radius and a black fill color.
    pub fn create_layer(
        &mut self,
        name: &str,
        kind: LayerKind,
        width: u32,
        height: u32,
        layer_stack: LayerStack,
    ) -> LayerId {
        let table = Arc::make_mut(&mut self.table);
        let idx = table.allocate(name, kind, width, height, layer_stack);
        let id = table.id_at(idx);

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.advance();
        id
    }

    /// Destroys a layer.
    ///
    /// The layer is unlinked from its parent. Its children are detached and
    /// become orphaned until reparented. Layers anchored to it lose their
    /// anchor and are orphaned until reparented or re-anchored. Orphans are
    /// not composited.
    pub fn destroy_layer(&mut self, id: LayerId) -> Result<Generation, LayerError> {
        let idx = self.table.check(id)?;
        let table = Arc::make_mut(&mut self.table);

        let children: Vec<u32> = table.children(id)?.map(LayerId::index).collect();
        for child in children {
            table.unlink_from_parent(child);
            table.orphaned[child as usize] = true;
            table.lost_parent[child as usize] = true;
            self.dirty.remove_dependency(child, idx, dirty::GEOMETRY);
            self.dirty.mark_with(child, dirty::GEOMETRY, &EagerPolicy);
            self.dirty.mark(child, dirty::ORDER);
        }

        for other in 0..table.len {
            let anchored = table.relative[other as usize].is_some_and(|(target, _)| target == idx);
            if anchored && table.is_live_index(other) {
                table.relative[other as usize] = None;
                table.orphaned[other as usize] = true;
                self.dirty.mark(other, dirty::ORDER);
            }
        }

        let parent = table.parent[idx as usize];
        if parent != INVALID {
            table.unlink_from_parent(idx);
            self.dirty.remove_dependency(idx, parent, dirty::GEOMETRY);
            self.dirty.mark(parent, dirty::TOPOLOGY);
        }
        table.relative[idx as usize] = None;

        self.dirty.remove_key(idx);
        table.release(idx);
        self.pending_removed.push(idx);
        Ok(self.advance())
    }

    /// Replaces the content of a buffer-backed layer.
    pub fn submit_buffer(
        &mut self,
        id: LayerId,
        buffer: impl Into<Arc<PixelBuffer>>,
    ) -> Result<Generation, LayerError> {
        let idx = self.table.check(id)?;
        if !self.table.kind[idx as usize].is_buffer_backed() {
            return Err(LayerError::NotBufferBacked(id));
        }
        let table = Arc::make_mut(&mut self.table);
        table.content[idx as usize] = Some(buffer.into());

        self.dirty.mark(idx, dirty::APPEARANCE);
        self.dirty.mark(idx, dirty::GEOMETRY);
        Ok(self.advance())
    }

    // -- Transactions --

    /// Validates and applies a transaction as one unit.
    ///
    /// Every referenced handle must be alive, and no reparent or anchor op
    /// may close a loop in the combined parent + anchor graph (checked in
    /// submission order against the links staged so far). On error nothing
    /// is mutated and the generation is unchanged.
    ///
    /// On success the ops are applied in submission order (the last write to
    /// a field wins) and the generation advances, even for an empty
    /// transaction.
    pub fn commit(&mut self, txn: &Transaction) -> Result<Generation, TransactionError> {
        self.check_transaction(txn)?;

        let table = Arc::make_mut(&mut self.table);
        for &(layer, op) in txn.ops() {
            let idx = layer.idx;
            let i = idx as usize;
            match op {
                LayerOp::SetPosition(position) => {
                    table.position[i] = position;
                    self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
                }
                LayerOp::SetCrop(crop) => {
                    table.crop[i] = crop;
                    self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
                }
                LayerOp::SetCornerRadius(radius) => {
                    table.corner_radius[i] = if radius > 0.0 { radius } else { 0.0 };
                    self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
                }
                LayerOp::SetAlpha(alpha) => {
                    table.alpha[i] = clamp_alpha(alpha);
                    self.dirty.mark(idx, dirty::APPEARANCE);
                }
                LayerOp::SetFlags { value, mask } => {
                    table.flags[i] = table.flags[i].masked(value, mask);
                    self.dirty.mark(idx, dirty::APPEARANCE);
                }
                LayerOp::SetZ(z) => {
                    table.z[i] = z;
                    self.dirty.mark(idx, dirty::ORDER);
                }
                LayerOp::SetRelativeLayer { target, offset } => {
                    table.relative[i] = Some((target.idx, offset));
                    table.orphaned[i] = table.lost_parent[i];
                    self.dirty.mark(idx, dirty::ORDER);
                }
                LayerOp::ClearRelativeLayer => {
                    table.relative[i] = None;
                    self.dirty.mark(idx, dirty::ORDER);
                }
                LayerOp::SetLayerStack(stack) => {
                    table.layer_stack[i] = stack;
                    self.dirty.mark(idx, dirty::ORDER);
                }
                LayerOp::SetColor(color) => {
                    table.color[i] = color;
                    self.dirty.mark(idx, dirty::APPEARANCE);
                }
                LayerOp::Reparent(parent) => {
                    relink(table, &mut self.dirty, idx, parent.map(LayerId::index));
                }
            }
        }

        Ok(self.advance())
    }

    /// Checks every handle, then replays the link ops on a staged copy of
    /// the parent and anchor links to reject cycles.
    fn check_transaction(&self, txn: &Transaction) -> Result<(), TransactionError> {
        let table = &*self.table;
        for (layer, op) in txn.ops() {
            table.check(*layer)?;
            if let Some(target) = op.target() {
                table.check(target)?;
            }
        }

        let links_anything = txn.ops().iter().any(|(_, op)| {
            matches!(
                op,
                LayerOp::Reparent(Some(_)) | LayerOp::SetRelativeLayer { .. }
            )
        });
        if !links_anything {
            return Ok(());
        }

        let mut staged = StagedLinks::new(table);
        for &(layer, op) in txn.ops() {
            match op {
                LayerOp::Reparent(Some(parent)) => {
                    if staged.reaches(parent.idx, layer.idx) {
                        return Err(TransactionError::CycleDetected {
                            layer,
                            target: parent,
                        });
                    }
                    staged.parent[layer.idx as usize] = parent.idx;
                }
                LayerOp::Reparent(None) => staged.parent[layer.idx as usize] = INVALID,
                LayerOp::SetRelativeLayer { target, .. } => {
                    if staged.reaches(target.idx, layer.idx) {
                        return Err(TransactionError::CycleDetected { layer, target });
                    }
                    staged.anchor[layer.idx as usize] = target.idx;
                }
                LayerOp::ClearRelativeLayer => staged.anchor[layer.idx as usize] = INVALID,
                _ => {}
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }
}

/// Moves slot `idx` under `parent` (or makes it a root), keeping dirty
/// dependency edges in step with the tree.
fn relink(table: &mut LayerTable, tracker: &mut DirtyTracker<u32>, idx: u32, parent: Option<u32>) {
    let old = table.parent[idx as usize];
    if old != INVALID {
        table.unlink_from_parent(idx);
        tracker.remove_dependency(idx, old, dirty::GEOMETRY);
        tracker.mark(old, dirty::TOPOLOGY);
    }
    if let Some(p) = parent {
        table.link_child(p, idx);
        let linked = tracker.add_dependency(idx, p, dirty::GEOMETRY);
        debug_assert!(linked.is_ok(), "parent link {idx} -> {p} closes a cycle");
        tracker.mark(p, dirty::TOPOLOGY);
    }
    table.orphaned[idx as usize] = false;
    table.lost_parent[idx as usize] = false;
    tracker.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
    tracker.mark(idx, dirty::ORDER);
}

/// Clamps to `[0, 1]`; NaN becomes 0.
fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

/// Parent and anchor links as they will be after the ops seen so far.
struct StagedLinks {
    parent: Vec<u32>,
    anchor: Vec<u32>,
    visited: Vec<bool>,
    stack: Vec<u32>,
}

impl StagedLinks {
    fn new(table: &LayerTable) -> Self {
        Self {
            parent: table.parent.clone(),
            anchor: table
                .relative
                .iter()
                .map(|rel| rel.map_or(INVALID, |(target, _)| target))
                .collect(),
            visited: alloc::vec![false; table.len as usize],
            stack: Vec::new(),
        }
    }

    /// Returns whether `to` is reachable from `from` along parent and anchor
    /// edges (including `from == to`).
    fn reaches(&mut self, from: u32, to: u32) -> bool {
        self.visited.fill(false);
        self.stack.clear();
        self.stack.push(from);
        while let Some(idx) = self.stack.pop() {
            if idx == to {
                return true;
            }
            if core::mem::replace(&mut self.visited[idx as usize], true) {
                continue;
            }
            for next in [self.parent[idx as usize], self.anchor[idx as usize]] {
                if next != INVALID {
                    self.stack.push(next);
                }
            }
        }
        false
    }
}
