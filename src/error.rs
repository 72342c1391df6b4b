//! Error types
//!
//! Reconciliation itself is a pure transformation; the only failures are
//! precondition violations on its inputs. The store and codec layers have
//! their own error enums.
//!
//! Author: Moroya Sakamoto

use thiserror::Error;

use crate::block::Uid;

/// Input rejected before (or while) computing an operation list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("uid {0:?} appears more than once in the {1} snapshot")]
    DuplicateUid(Uid, &'static str),

    #[error("move solver input mismatch: {0}")]
    SequenceMismatch(String),
}

/// Mutation rejected by a [`BlockStore`](crate::store::BlockStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown block {0:?}")]
    UnknownBlock(Uid),

    #[error("unknown parent {0:?}")]
    UnknownParent(Uid),

    #[error("block {0:?} already exists")]
    DuplicateBlock(Uid),

    #[error("moving {uid:?} under {parent:?} would make it its own ancestor")]
    CyclicMove { uid: Uid, parent: Uid },
}

/// JSON encode/decode failure
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
