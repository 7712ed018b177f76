// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint-order resolution.
//!
//! Resolution turns the layer tree of one [`Snapshot`] into a back-to-front
//! list of [`PaintEntry`]s for one [`LayerStack`]:
//!
//! 1. Every live layer is assigned to a *sibling group* and an effective
//!    key. A layer without an anchor joins its logical parent's group (or the
//!    root group) with key `z`. An anchored layer joins the group its target
//!    is ordered in, with key `target key + offset`. Anchors may chain; each
//!    chain is reduced once and memoized.
//! 2. Each group is sorted by `(key, rank, sequence)`. Ordinary members have
//!    rank 0; anchored members have rank 1 for a non-negative offset and -1
//!    for a negative one, so they sort after (or before) an ordinary sibling
//!    with the same key.
//! 3. Starting from the root group, each layer is emitted between its
//!    negative-key members (painted first) and its non-negative-key members.
//!
//! Layers with an orphaned logical ancestry (a destroyed parent somewhere up
//! the chain, or a destroyed anchor target) are excluded together with
//! everything ordered under them. Hidden layers stay in the order with
//! [`PaintEntry::hidden`] set; hiding is not inherited.
//!
//! A layer paints in the layer stack of the tree it is ordered into, so an
//! anchored layer follows its target's stack.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::geometry::{Placement, place};
use crate::layer::{INVALID, LayerFlags, LayerId, LayerTable};
use crate::snapshot::Snapshot;
use crate::stack::{Generation, LayerStack};

/// One layer in a resolved paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintEntry {
    /// The layer being painted.
    pub layer: LayerId,
    /// Stack of the tree the layer is ordered into. For an anchored layer
    /// this follows its anchor target, not its own logical root.
    pub layer_stack: LayerStack,
    /// Whether the layer's own content is hidden.
    pub hidden: bool,
    /// Output-space translation, clip and masks.
    pub placement: Placement,
}

/// A resolved back-to-front paint order for one layer stack.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintOrder {
    generation: Generation,
    layer_stack: LayerStack,
    entries: Vec<PaintEntry>,
}

impl PaintOrder {
    /// The generation this order was resolved against.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The layer stack this order was resolved for.
    #[must_use]
    pub fn layer_stack(&self) -> LayerStack {
        self.layer_stack
    }

    /// Entries, back to front.
    #[must_use]
    pub fn entries(&self) -> &[PaintEntry] {
        &self.entries
    }

    /// Layers in paint order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.entries.iter().map(|e| e.layer)
    }
}

/// Resolves the paint order of `layer_stack` in `snapshot`.
#[must_use]
pub fn resolve(snapshot: &Snapshot, layer_stack: LayerStack) -> PaintOrder {
    let mut resolver = Resolver::new(snapshot.table());
    let mut entries = Vec::new();
    resolver.emit_roots(layer_stack, &mut entries);
    PaintOrder {
        generation: snapshot.generation(),
        layer_stack,
        entries,
    }
}

/// Memoizes resolved paint orders for the most recent generation.
///
/// Orders are keyed by layer stack; any lookup for a newer generation drops
/// everything cached for older ones. Lookups for an older generation are
/// resolved but not cached.
#[derive(Debug, Default)]
pub struct ResolverCache {
    generation: Generation,
    orders: BTreeMap<LayerStack, Arc<PaintOrder>>,
}

impl ResolverCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached order for `(snapshot.generation(), layer_stack)`,
    /// resolving it on a miss.
    pub fn get_or_resolve(&mut self, snapshot: &Snapshot, layer_stack: LayerStack) -> Arc<PaintOrder> {
        if snapshot.generation() < self.generation {
            return Arc::new(resolve(snapshot, layer_stack));
        }
        if snapshot.generation() > self.generation {
            self.orders.clear();
            self.generation = snapshot.generation();
        }
        Arc::clone(
            self.orders
                .entry(layer_stack)
                .or_insert_with(|| Arc::new(resolve(snapshot, layer_stack))),
        )
    }

    /// Returns the cached order without resolving.
    #[must_use]
    pub fn get(&self, generation: Generation, layer_stack: LayerStack) -> Option<Arc<PaintOrder>> {
        (generation == self.generation)
            .then(|| self.orders.get(&layer_stack).cloned())
            .flatten()
    }

    /// Drops every cached order.
    pub fn clear(&mut self) {
        self.orders.clear();
    }
}

/// Which sibling group a layer is ordered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    Root,
    Children(u32),
}

/// Where a layer sorts within its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    key: i64,
    rank: i8,
    sequence: u64,
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Unresolved,
    Excluded,
    Placed(Group, SortKey),
}

struct Resolver<'a> {
    table: &'a LayerTable,
    slots: Vec<Slot>,
    root_group: Vec<(SortKey, u32)>,
    children: Vec<SmallVec<[(SortKey, u32); 4]>>,
}

impl<'a> Resolver<'a> {
    fn new(table: &'a LayerTable) -> Self {
        let len = table.slot_count() as usize;
        let mut resolver = Self {
            table,
            slots: alloc::vec![Slot::Unresolved; len],
            root_group: Vec::new(),
            children: alloc::vec![SmallVec::new(); len],
        };
        for idx in 0..table.slot_count() {
            if table.is_live_index(idx) {
                if let Slot::Placed(group, key) = resolver.slot(idx) {
                    match group {
                        Group::Root => resolver.root_group.push((key, idx)),
                        Group::Children(p) => resolver.children[p as usize].push((key, idx)),
                    }
                }
            }
        }
        resolver.root_group.sort_unstable();
        for group in &mut resolver.children {
            group.sort_unstable();
        }
        resolver
    }

    /// Resolves the group and key of `idx`, following anchor chains.
    fn slot(&mut self, idx: u32) -> Slot {
        // Walk the anchor chain up to the first resolved (or unanchored) link.
        let mut chain: SmallVec<[u32; 4]> = SmallVec::new();
        let mut cur = idx;
        let mut base = loop {
            match self.slots[cur as usize] {
                Slot::Unresolved => {}
                resolved => break resolved,
            }
            match self.table.relative[cur as usize] {
                Some((target, _)) => {
                    chain.push(cur);
                    cur = target;
                }
                None => {
                    let slot = self.own_slot(cur);
                    self.slots[cur as usize] = slot;
                    break slot;
                }
            }
        };

        // Unwind: each anchored link takes its target's group.
        while let Some(link) = chain.pop() {
            let slot = match (base, self.table.relative[link as usize]) {
                (Slot::Placed(group, target), Some((_, offset))) if !self.detached(link) => {
                    Slot::Placed(group, SortKey {
                        key: target.key + i64::from(offset),
                        rank: if offset >= 0 { 1 } else { -1 },
                        sequence: self.table.sequence[link as usize],
                    })
                }
                _ => Slot::Excluded,
            };
            self.slots[link as usize] = slot;
            base = slot;
        }
        base
    }

    /// Slot of an unanchored layer.
    fn own_slot(&self, idx: u32) -> Slot {
        if self.detached(idx) {
            return Slot::Excluded;
        }
        let parent = self.table.parent[idx as usize];
        let group = if parent == INVALID {
            Group::Root
        } else {
            Group::Children(parent)
        };
        Slot::Placed(group, SortKey {
            key: i64::from(self.table.z[idx as usize]),
            rank: 0,
            sequence: self.table.sequence[idx as usize],
        })
    }

    /// Returns whether `idx` or any logical ancestor is orphaned.
    fn detached(&self, idx: u32) -> bool {
        let mut cur = idx;
        loop {
            if self.table.orphaned[cur as usize] {
                return true;
            }
            match self.table.parent[cur as usize] {
                INVALID => return false,
                p => cur = p,
            }
        }
    }

    fn logical_root(&self, idx: u32) -> u32 {
        let mut cur = idx;
        while self.table.parent[cur as usize] != INVALID {
            cur = self.table.parent[cur as usize];
        }
        cur
    }

    fn emit_roots(&mut self, layer_stack: LayerStack, out: &mut Vec<PaintEntry>) {
        let roots = core::mem::take(&mut self.root_group);
        for &(_, idx) in &roots {
            if self.ordering_stack(idx) == layer_stack {
                self.emit(idx, layer_stack, out);
            }
        }
    }

    fn emit(&self, idx: u32, layer_stack: LayerStack, out: &mut Vec<PaintEntry>) {
        let members = &self.children[idx as usize];
        let split = members.partition_point(|(key, _)| key.key < 0);
        for &(_, child) in &members[..split] {
            self.emit(child, layer_stack, out);
        }
        out.push(PaintEntry {
            layer: self.table.handle_at(idx),
            layer_stack,
            hidden: self.table.flags[idx as usize].contains(LayerFlags::HIDDEN),
            placement: place(self.table, idx),
        });
        for &(_, child) in &members[split..] {
            self.emit(child, layer_stack, out);
        }
    }

    /// Stack of the tree a root-group member is ordered into: the logical
    /// root of the end of its anchor chain.
    fn ordering_stack(&self, idx: u32) -> LayerStack {
        let mut cur = idx;
        while let Some((target, _)) = self.table.relative[cur as usize] {
            cur = target;
        }
        self.table.layer_stack[self.logical_root(cur) as usize]
    }
}
