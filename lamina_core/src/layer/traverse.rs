// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, LayerId};
use super::table::LayerTable;

/// An iterator over the direct children of a layer, in attach order.
///
/// Created by [`LayerTable::children`].
#[derive(Debug)]
pub struct Children<'a> {
    table: &'a LayerTable,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(table: &'a LayerTable, first: u32) -> Self {
        Self {
            table,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.table.next_sibling[idx as usize];
        Some(self.table.id_at(idx))
    }
}
