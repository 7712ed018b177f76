// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output partitioning and commit generations.
//!
//! [`LayerStack`] tags which logical output a layer tree is composited into.
//! [`Generation`] numbers each fully committed registry state.

use core::fmt;

/// Identifies a logical output that layers can be composited into.
///
/// Only root layers are attached to a stack directly; descendants are
/// composited into the stack of their root. Core code never interprets the
/// value beyond equality.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LayerStack(pub u32);

impl LayerStack {
    /// Returns the stack tag immediately after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerStack({})", self.0)
    }
}

/// A monotonically increasing commit counter.
///
/// Every successful commit (transaction, layer creation or destruction, buffer
/// submission) produces a new generation. Cached paint orders are keyed by
/// the generation they were resolved against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation of an empty registry that has never committed.
    pub const INITIAL: Self = Self(0);

    /// Returns the generation following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}
