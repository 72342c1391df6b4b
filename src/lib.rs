//! outline-sync — Block Tree Reconciliation
//!
//! Don't re-upload the outline, replay the difference.
//!
//! Turns one snapshot of an ordered, nested outline of blocks into another
//! using only the node-level mutations a block store exposes:
//! - Lossless nested ⇄ flat conversion with explicit depth and parent uid
//! - Level-by-level structural diff (create, remove, relocate)
//! - Sibling reordering through positional moves
//! - Operation lists that replay in order without ever referencing a
//!   parent that does not exist yet
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`block`] | Nested and flat block representations |
//! | [`codec`] | JSON encoding of snapshots and operation lists |
//! | [`config`] | Reconciliation options (container uid, validation) |
//! | [`diff`] | Reconciliation engine (Create, Remove, Move) and simple compare |
//! | [`error`] | Error types |
//! | [`flatten`] | Flatten / unflatten between the two representations |
//! | [`moves`] | Positional move solver for sibling reordering |
//! | [`store`] | Block store interface and in-memory reference store |
//! | [`sync`] | Structural operations plus content updates |
//!
//! # Quick Start
//!
//! ```
//! use outline_sync::{reconcile, Block, Operation};
//!
//! let old = vec![Block::new("1", 0, "first"), Block::new("2", 1, "second")];
//! let new = vec![Block::new("2", 0, "second"), Block::new("1", 1, "first")];
//!
//! // Swapping two siblings is a single move
//! let ops = reconcile(&old, &new).unwrap();
//! assert_eq!(ops.len(), 1);
//! assert!(matches!(&ops[0], Operation::Move { uid, order: 0, .. } if uid == "2"));
//! ```
//!
//! Author: Moroya Sakamoto

pub mod block;
pub mod codec;
pub mod config;
pub mod diff;
pub mod error;
pub mod flatten;
pub mod moves;
pub mod store;
pub mod sync;

pub use block::{normalize_tree, Attrs, Block, FlatBlock, Uid};
pub use codec::{decode_operations, decode_tree, encode_operations, encode_tree};
pub use config::ReconcileConfig;
pub use diff::{
    op_stats, reconcile, reconcile_level, reconcile_with, simple_compare, LevelPlan, OpStats,
    Operation, SimpleDiff,
};
pub use error::{CodecError, ReconcileError, StoreError};
pub use flatten::{flatten, unflatten};
pub use moves::{minimal_moves, replay_moves, Move};
pub use store::{apply_operations, BlockStore, MemoryStore};
pub use sync::{content_updates, plan_sync, ContentUpdate, SyncPlan};
