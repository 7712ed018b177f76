// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for registry access and transaction commits.

use crate::layer::LayerId;

/// Errors from direct registry operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// The handle does not refer to a live layer.
    #[error("layer {0:?} does not exist")]
    NotFound(LayerId),
    /// Buffer content was submitted to a color or container layer.
    #[error("layer {0:?} cannot hold buffer content")]
    NotBufferBacked(LayerId),
}

/// Reasons a transaction was rejected.
///
/// A rejected transaction leaves every layer untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// An operation referenced a layer that is not alive.
    #[error("transaction references unknown layer {0:?}")]
    InvalidHandle(LayerId),
    /// A reparent or relative-anchor operation would close a loop in the
    /// parent/anchor graph.
    #[error("linking {layer:?} to {target:?} would create a cycle")]
    CycleDetected {
        /// The layer being reparented or anchored.
        layer: LayerId,
        /// The requested parent or anchor target.
        target: LayerId,
    },
}

impl From<LayerError> for TransactionError {
    fn from(err: LayerError) -> Self {
        match err {
            LayerError::NotFound(id) | LayerError::NotBufferBacked(id) => Self::InvalidHandle(id),
        }
    }
}
