// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer table.
//!
//! The table holds every layer property plus topology links. It is cheap to
//! share: [`LayerStore`](super::LayerStore) keeps it behind an `Arc` and
//! copies it on write, and each published [`Snapshot`](crate::snapshot::Snapshot)
//! holds the version that was current at its commit.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use super::id::{INVALID, LayerId};
use super::props::{LayerFlags, LayerKind, OrderKey, Rgb};
use super::record::LayerRecord;
use super::traverse::Children;
use crate::buffer::PixelBuffer;
use crate::error::LayerError;
use crate::stack::LayerStack;

/// Struct-of-arrays storage for all layer slots.
///
/// Dead slots are recycled through a free list; their generation is bumped
/// on destruction so stale [`LayerId`]s never resolve again.
#[derive(Clone, Debug, Default)]
pub struct LayerTable {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) relative: Vec<Option<(u32, i32)>>,
    pub(crate) orphaned: Vec<bool>,
    /// Set when the parent was destroyed; only a reparent clears it.
    pub(crate) lost_parent: Vec<bool>,

    // -- Identity --
    pub(crate) name: Vec<Arc<str>>,
    pub(crate) kind: Vec<LayerKind>,
    pub(crate) size: Vec<(u32, u32)>,
    pub(crate) sequence: Vec<u64>,

    // -- Properties --
    pub(crate) z: Vec<i32>,
    pub(crate) position: Vec<Point>,
    pub(crate) crop: Vec<Option<Rect>>,
    pub(crate) corner_radius: Vec<f64>,
    pub(crate) alpha: Vec<f32>,
    pub(crate) flags: Vec<LayerFlags>,
    pub(crate) color: Vec<Rgb>,
    pub(crate) layer_stack: Vec<LayerStack>,
    pub(crate) content: Vec<Option<Arc<PixelBuffer>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) next_sequence: u64,
}

impl LayerTable {
    /// Allocates a slot with default properties and returns its index.
    pub(crate) fn allocate(
        &mut self,
        name: &str,
        kind: LayerKind,
        width: u32,
        height: u32,
        layer_stack: LayerStack,
    ) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let name: Arc<str> = Arc::from(String::from(name));

        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.relative[i] = None;
            self.orphaned[i] = false;
            self.lost_parent[i] = false;
            self.name[i] = name;
            self.kind[i] = kind;
            self.size[i] = (width, height);
            self.sequence[i] = sequence;
            self.z[i] = 0;
            self.position[i] = Point::ORIGIN;
            self.crop[i] = None;
            self.corner_radius[i] = 0.0;
            self.alpha[i] = 1.0;
            self.flags[i] = LayerFlags::empty();
            self.color[i] = Rgb::BLACK;
            self.layer_stack[i] = layer_stack;
            self.content[i] = None;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.relative.push(None);
            self.orphaned.push(false);
            self.lost_parent.push(false);
            self.name.push(name);
            self.kind.push(kind);
            self.size.push((width, height));
            self.sequence.push(sequence);
            self.z.push(0);
            self.position.push(Point::ORIGIN);
            self.crop.push(None);
            self.corner_radius.push(0.0);
            self.alpha.push(1.0);
            self.flags.push(LayerFlags::empty());
            self.color.push(Rgb::BLACK);
            self.layer_stack.push(layer_stack);
            self.content.push(None);
            self.generation.push(0);
            self.alive.push(true);
            idx
        }
    }

    /// Marks a slot dead and bumps its generation. Links must already be
    /// cleared by the caller.
    pub(crate) fn release(&mut self, idx: u32) {
        let i = idx as usize;
        self.alive[i] = false;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.content[i] = None;
        self.free_list.push(idx);
    }

    // -- Handle resolution --

    /// Returns the slot index for `id` if it refers to a live layer.
    pub(crate) fn check(&self, id: LayerId) -> Result<u32, LayerError> {
        if self.is_alive(id) {
            Ok(id.idx)
        } else {
            Err(LayerError::NotFound(id))
        }
    }

    /// Builds the handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether `idx` is a live slot.
    #[inline]
    pub(crate) fn is_live_index(&self, idx: u32) -> bool {
        idx < self.len && self.alive[idx as usize]
    }

    // -- Topology maintenance --

    /// Appends `c` as the last child of `p`. `c` must be unlinked.
    pub(crate) fn link_child(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list, if it has a parent.
    pub(crate) fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return;
        }
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    // -- Public queries --

    /// Returns whether the handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    /// Returns a copy of every property of a layer.
    pub fn layer(&self, id: LayerId) -> Result<LayerRecord, LayerError> {
        let idx = self.check(id)?;
        let i = idx as usize;
        let parent = self.parent[i];
        Ok(LayerRecord {
            id,
            name: Arc::clone(&self.name[i]),
            kind: self.kind[i],
            width: self.size[i].0,
            height: self.size[i].1,
            sequence: self.sequence[i],
            parent: (parent != INVALID).then(|| self.id_at(parent)),
            relative: self.relative[i].map(|(t, offset)| (self.id_at(t), offset)),
            orphaned: self.orphaned[i],
            z: self.z[i],
            position: self.position[i],
            crop: self.crop[i],
            corner_radius: self.corner_radius[i],
            alpha: self.alpha[i],
            flags: self.flags[i],
            color: self.color[i],
            layer_stack: self.layer_stack[i],
            content: self.content[i].clone(),
        })
    }

    /// Returns the parent of a layer, if any.
    pub fn parent(&self, id: LayerId) -> Result<Option<LayerId>, LayerError> {
        let idx = self.check(id)?;
        let p = self.parent[idx as usize];
        Ok((p != INVALID).then(|| self.id_at(p)))
    }

    /// Returns an iterator over the direct children of a layer, in the order
    /// they were attached.
    pub fn children(&self, id: LayerId) -> Result<Children<'_>, LayerError> {
        let idx = self.check(id)?;
        Ok(Children::new(self, self.first_child[idx as usize]))
    }

    /// Returns the live layers that have no parent, in slot order.
    ///
    /// Orphaned layers (whose parent was destroyed) are included; they have
    /// no parent but are not composited until reparented.
    #[must_use]
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.len)
            .filter(|&idx| self.alive[idx as usize] && self.parent[idx as usize] == INVALID)
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as found in paint orders and change
    // lists) and skip generation validation.

    /// Returns the ordering key at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a live slot.
    #[must_use]
    pub fn order_key_at(&self, idx: u32) -> OrderKey {
        self.assert_live(idx);
        match self.relative[idx as usize] {
            Some((target, offset)) => OrderKey::RelativeTo {
                target: self.id_at(target),
                offset,
            },
            None => OrderKey::UnderParent(self.z[idx as usize]),
        }
    }

    /// Returns the parent slot of raw slot `idx`, if any.
    #[inline]
    #[must_use]
    pub fn parent_at(&self, idx: u32) -> Option<u32> {
        self.assert_live(idx);
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }

    /// Returns the kind of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn kind_at(&self, idx: u32) -> LayerKind {
        self.assert_live(idx);
        self.kind[idx as usize]
    }

    /// Returns the position of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn position_at(&self, idx: u32) -> Point {
        self.assert_live(idx);
        self.position[idx as usize]
    }

    /// Returns the crop of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn crop_at(&self, idx: u32) -> Option<Rect> {
        self.assert_live(idx);
        self.crop[idx as usize]
    }

    /// Returns the corner radius of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn corner_radius_at(&self, idx: u32) -> f64 {
        self.assert_live(idx);
        self.corner_radius[idx as usize]
    }

    /// Returns the alpha of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn alpha_at(&self, idx: u32) -> f32 {
        self.assert_live(idx);
        self.alpha[idx as usize]
    }

    /// Returns the flags of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn flags_at(&self, idx: u32) -> LayerFlags {
        self.assert_live(idx);
        self.flags[idx as usize]
    }

    /// Returns the fill color of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn color_at(&self, idx: u32) -> Rgb {
        self.assert_live(idx);
        self.color[idx as usize]
    }

    /// Returns the layer stack tag stored on raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn layer_stack_at(&self, idx: u32) -> LayerStack {
        self.assert_live(idx);
        self.layer_stack[idx as usize]
    }

    /// Returns the buffer content of the layer at raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn content_at(&self, idx: u32) -> Option<&Arc<PixelBuffer>> {
        self.assert_live(idx);
        self.content[idx as usize].as_ref()
    }

    /// Returns the local content bounds of the layer at raw slot `idx`.
    ///
    /// Buffer-backed layers are bounded by their submitted buffer (and have
    /// empty bounds without one). Color layers are bounded by their created
    /// size, which may be empty. Containers are unbounded.
    #[must_use]
    pub fn bounds_at(&self, idx: u32) -> Option<Rect> {
        self.assert_live(idx);
        let i = idx as usize;
        match self.kind[i] {
            LayerKind::BufferQueue | LayerKind::BufferState => Some(match &self.content[i] {
                Some(buf) => Rect::new(0.0, 0.0, f64::from(buf.width()), f64::from(buf.height())),
                None => Rect::ZERO,
            }),
            LayerKind::Color => {
                let (w, h) = self.size[i];
                Some(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)))
            }
            LayerKind::Container => None,
        }
    }

    /// Returns the creation sequence number of raw slot `idx`.
    #[inline]
    #[must_use]
    pub fn sequence_at(&self, idx: u32) -> u64 {
        self.assert_live(idx);
        self.sequence[idx as usize]
    }

    /// Returns whether raw slot `idx` lost its parent or anchor target.
    #[inline]
    #[must_use]
    pub fn orphaned_at(&self, idx: u32) -> bool {
        self.assert_live(idx);
        self.orphaned[idx as usize]
    }

    /// Returns the handle for raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a live slot.
    #[must_use]
    pub fn handle_at(&self, idx: u32) -> LayerId {
        self.assert_live(idx);
        self.id_at(idx)
    }

    /// Returns the number of slots (live or free).
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    fn assert_live(&self, idx: u32) {
        assert!(
            self.is_live_index(idx),
            "slot index {idx} is not a live layer (len {})",
            self.len
        );
    }
}
