// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change reporting.
//!
//! Mutations only mark dirty channels; [`LayerStore::take_changes`] drains
//! them:
//!
//! 1. **GEOMETRY**: drained with the affected set, so descendants of a moved,
//!    cropped or reparented layer are included.
//! 2. **APPEARANCE** / **ORDER**: local-only; just the marked layers.
//! 3. **TOPOLOGY**: drained to decide `topology_changed`.
//!
//! [`LayerChanges`] uses raw slot indices (`u32`) rather than
//! [`LayerId`](super::LayerId) handles so consumers can index the table via
//! the `*_at()` accessors (e.g.
//! [`position_at`](super::LayerTable::position_at)) without paying for
//! generation checks on every access.

use alloc::vec::Vec;

use super::store::LayerStore;
use crate::dirty;

/// The set of changes since the previous [`LayerStore::take_changes`] call.
///
/// Each field contains the raw slot indices of live layers that changed in
/// the corresponding category. Slots destroyed in the meantime appear only in
/// [`removed`](Self::removed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerChanges {
    /// Layers whose accumulated translation, clip or mask may have changed.
    pub geometry: Vec<u32>,
    /// Layers whose alpha, flags, color or content changed.
    pub appearance: Vec<u32>,
    /// Layers whose ordering key or layer stack changed.
    pub order: Vec<u32>,
    /// Layers created since the last drain.
    pub added: Vec<u32>,
    /// Layers destroyed since the last drain.
    pub removed: Vec<u32>,
    /// Whether any parent/child link changed.
    pub topology_changed: bool,
}

impl LayerChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.appearance.clear();
        self.order.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.appearance.is_empty()
            && self.order.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl LayerStore {
    /// Drains every dirty channel and returns what changed.
    pub fn take_changes(&mut self) -> LayerChanges {
        let mut changes = LayerChanges::default();
        self.take_changes_into(&mut changes);
        changes
    }

    /// Like [`take_changes`](Self::take_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn take_changes_into(&mut self, changes: &mut LayerChanges) {
        changes.clear();

        let geometry: Vec<u32> = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.geometry = self.retain_live(geometry);

        let appearance: Vec<u32> = self
            .dirty
            .drain(dirty::APPEARANCE)
            .deterministic()
            .run()
            .collect();
        changes.appearance = self.retain_live(appearance);

        let order: Vec<u32> = self
            .dirty
            .drain(dirty::ORDER)
            .deterministic()
            .run()
            .collect();
        changes.order = self.retain_live(order);

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        changes.added.retain(|&idx| self.is_live_index(idx));
        changes.topology_changed =
            !topology.is_empty() || !changes.added.is_empty() || !changes.removed.is_empty();
    }

    fn retain_live(&self, mut indices: Vec<u32>) -> Vec<u32> {
        indices.retain(|&idx| self.is_live_index(idx));
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::layer::{LayerFlags, LayerKind};
    use crate::stack::LayerStack;
    use crate::transaction::Transaction;

    #[test]
    fn creation_is_reported_once() {
        let mut store = LayerStore::new();
        let id = store.create_layer("a", LayerKind::Container, 0, 0, LayerStack(0));

        let changes = store.take_changes();
        assert_eq!(changes.added, [id.index()]);
        assert!(changes.topology_changed);

        let changes = store.take_changes();
        assert!(changes.is_empty());
    }

    #[test]
    fn moving_parent_marks_descendants() {
        let mut store = LayerStore::new();
        let root = store.create_layer("root", LayerKind::Container, 0, 0, LayerStack(0));
        let child = store.create_layer("child", LayerKind::Container, 0, 0, LayerStack(0));
        let grandchild = store.create_layer("gc", LayerKind::Color, 4, 4, LayerStack(0));
        let mut txn = Transaction::new();
        txn.reparent(child, Some(root)).reparent(grandchild, Some(child));
        store.commit(&txn).unwrap();
        let _ = store.take_changes();

        let mut txn = Transaction::new();
        txn.set_position(root, 5.0, 5.0);
        store.commit(&txn).unwrap();
        let changes = store.take_changes();
        assert!(changes.geometry.contains(&root.index()));
        assert!(changes.geometry.contains(&child.index()));
        assert!(changes.geometry.contains(&grandchild.index()));
        assert!(!changes.topology_changed);
    }

    #[test]
    fn local_channels_do_not_propagate() {
        let mut store = LayerStore::new();
        let root = store.create_layer("root", LayerKind::Color, 4, 4, LayerStack(0));
        let child = store.create_layer("child", LayerKind::Color, 4, 4, LayerStack(0));
        let mut txn = Transaction::new();
        txn.reparent(child, Some(root));
        store.commit(&txn).unwrap();
        let _ = store.take_changes();

        let mut txn = Transaction::new();
        txn.set_alpha(root, 0.5)
            .set_flags(root, LayerFlags::HIDDEN, LayerFlags::HIDDEN)
            .set_z(root, 2);
        store.commit(&txn).unwrap();
        let changes = store.take_changes();
        assert_eq!(changes.appearance, [root.index()]);
        assert_eq!(changes.order, [root.index()]);
        assert!(changes.geometry.is_empty());
    }

    #[test]
    fn buffer_submission_marks_appearance_and_geometry() {
        let mut store = LayerStore::new();
        let id = store.create_layer("buf", LayerKind::BufferState, 4, 4, LayerStack(0));
        let _ = store.take_changes();

        store.submit_buffer(id, PixelBuffer::new(4, 4)).unwrap();
        let changes = store.take_changes();
        assert_eq!(changes.appearance, [id.index()]);
        assert_eq!(changes.geometry, [id.index()]);
    }

    #[test]
    fn destroyed_layers_are_only_reported_as_removed() {
        let mut store = LayerStore::new();
        let id = store.create_layer("a", LayerKind::Color, 4, 4, LayerStack(0));
        let _ = store.take_changes();

        let mut txn = Transaction::new();
        txn.set_alpha(id, 0.5);
        store.commit(&txn).unwrap();
        store.destroy_layer(id).unwrap();

        let changes = store.take_changes();
        assert!(changes.appearance.is_empty());
        assert_eq!(changes.removed, [id.index()]);
        assert!(changes.topology_changed);
    }
}
