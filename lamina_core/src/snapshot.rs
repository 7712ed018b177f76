// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable registry views.

use alloc::sync::Arc;
use core::ops::Deref;

use crate::layer::LayerTable;
use crate::stack::Generation;

/// The layer table as it was at one [`Generation`].
///
/// Cloning is cheap; the table is shared. Resolution and compositing only
/// ever read snapshots.
#[derive(Clone, Debug)]
pub struct Snapshot {
    generation: Generation,
    table: Arc<LayerTable>,
}

impl Snapshot {
    pub(crate) fn new(generation: Generation, table: Arc<LayerTable>) -> Self {
        Self { generation, table }
    }

    /// A snapshot of an empty registry at [`Generation::INITIAL`].
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Generation::INITIAL, Arc::new(LayerTable::default()))
    }

    /// Returns the generation this snapshot was taken at.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the underlying table.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &LayerTable {
        &self.table
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Snapshot {
    type Target = LayerTable;

    fn deref(&self) -> &LayerTable {
        &self.table
    }
}
