//! Full sync plan
//!
//! Structural operations alone leave content edits of unmoved blocks
//! behind. A [`SyncPlan`] pairs the reconciled operation list with the
//! whole-string content updates, in the order a store must receive them.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{Block, Uid};
use crate::config::ReconcileConfig;
use crate::diff::{op_stats, reconcile_with, simple_compare, Operation};
use crate::error::{ReconcileError, StoreError};
use crate::store::{apply_operations, BlockStore};

/// Whole-string content replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUpdate {
    pub uid: Uid,
    pub content: String,
}

/// Everything needed to bring a store from one snapshot to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Structural operations, replayed first and in order
    pub operations: Vec<Operation>,
    /// Content updates of blocks present in both snapshots
    pub updates: Vec<ContentUpdate>,
}

impl SyncPlan {
    /// True if the two snapshots were already identical
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.updates.is_empty()
    }

    /// Replay the operations, then the content updates
    pub fn apply<S>(&self, store: &mut S) -> Result<(), StoreError>
    where
        S: BlockStore + ?Sized,
    {
        apply_operations(store, &self.operations)?;
        for update in &self.updates {
            store.update(&update.uid, &update.content)?;
        }
        Ok(())
    }
}

/// Content updates for blocks that exist in both `a` and `b`, in `b`'s
/// pre-order. Newly created blocks are not listed; their content travels
/// with the create.
pub fn content_updates(a: &[Block], b: &[Block]) -> Vec<ContentUpdate> {
    simple_compare(a, b)
        .updated_blocks
        .into_iter()
        .map(|row| ContentUpdate {
            uid: row.uid,
            content: row.content,
        })
        .collect()
}

/// Structural operations plus content updates turning `a` into `b`
pub fn plan_sync(
    a: &[Block],
    b: &[Block],
    config: &ReconcileConfig,
) -> Result<SyncPlan, ReconcileError> {
    let operations = reconcile_with(a, b, config)?;
    let updates = content_updates(a, b);

    let stats = op_stats(&operations);
    debug!(
        structural = stats.total(),
        updates = updates.len(),
        "sync plan ready"
    );
    Ok(SyncPlan {
        operations,
        updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::normalize_tree;
    use crate::store::MemoryStore;

    #[test]
    fn test_content_updates_only_for_shared_blocks() {
        let a = vec![Block::new("1", 0, "x"), Block::new("2", 1, "same")];
        let b = vec![
            Block::new("1", 0, "y"),
            Block::new("2", 1, "same"),
            Block::new("3", 2, "new"),
        ];
        let updates = content_updates(&a, &b);
        assert_eq!(
            updates,
            vec![ContentUpdate {
                uid: "1".into(),
                content: "y".into()
            }]
        );
    }

    #[test]
    fn test_identical_snapshots_give_empty_plan() {
        let t = vec![Block::new("1", 0, "x").with_child(Block::new("2", 0, "y"))];
        let plan = plan_sync(&t, &t, &ReconcileConfig::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_apply_reaches_target() {
        let a = vec![
            Block::new("1", 0, "one").with_child(Block::new("3", 0, "three")),
            Block::new("2", 1, "two"),
        ];
        let b = vec![
            Block::new("2", 0, "TWO").with_children(vec![
                Block::new("3", 0, "three"),
                Block::new("4", 1, "four"),
            ]),
        ];
        let plan = plan_sync(&a, &b, &ReconcileConfig::default()).unwrap();
        assert_eq!(plan.updates.len(), 1);

        let mut store = MemoryStore::from_tree(&a, None).unwrap();
        plan.apply(&mut store).unwrap();
        assert_eq!(store.to_tree(), normalize_tree(&b));
    }

    #[test]
    fn test_plan_moves_and_edits_same_block() {
        let a = vec![Block::new("1", 0, "a"), Block::new("2", 1, "b")];
        let b = vec![Block::new("2", 0, "b!"), Block::new("1", 1, "a")];
        let plan = plan_sync(&a, &b, &ReconcileConfig::default()).unwrap();
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.updates[0].uid, "2");

        let mut store = MemoryStore::from_tree(&a, None).unwrap();
        plan.apply(&mut store).unwrap();
        assert_eq!(store.content("2"), Some("b!"));
    }

    #[test]
    fn test_plan_propagates_validation_error() {
        let a = vec![Block::new("1", 0, ""), Block::new("1", 1, "")];
        assert!(plan_sync(&a, &[], &ReconcileConfig::default()).is_err());
    }
}
