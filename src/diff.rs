//! Block tree reconciliation engine
//!
//! Computes the ordered create/remove/move operations that turn snapshot
//! `a` into snapshot `b` on a store that only knows node-level mutations.
//! Content edits of blocks that stay put are not operations here; see
//! [`crate::sync`] for those.
//!
//! Author: Moroya Sakamoto

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::block::{Block, FlatBlock, Uid};
use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::flatten::{flatten, max_depth, unflatten};
use crate::moves::{minimal_moves, relocate};

/// Structural operation against a block store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    /// Create a block. Its `parent_uid` and `order` give the position;
    /// `order` is the positional index among the live siblings. Serialized
    /// flat, next to the `type` key.
    Create(FlatBlock),
    /// Remove a block together with its subtree
    Remove { uid: Uid },
    /// Place an existing block at `order` under `parent_uid`
    Move {
        uid: Uid,
        order: usize,
        #[serde(rename = "parent-uid")]
        parent_uid: Option<Uid>,
    },
}

impl Operation {
    /// Uid of the block the operation acts on
    pub fn uid(&self) -> &str {
        match self {
            Operation::Create(block) => &block.uid,
            Operation::Remove { uid } | Operation::Move { uid, .. } => uid,
        }
    }

    /// Destination parent for creates and moves
    pub fn parent(&self) -> Option<&str> {
        match self {
            Operation::Create(block) => block.parent(),
            Operation::Move { parent_uid, .. } => parent_uid.as_deref(),
            Operation::Remove { .. } => None,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Operation::Create(_))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Operation::Remove { .. })
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Operation::Move { .. })
    }
}

/// Per-kind operation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpStats {
    pub creates: usize,
    pub removes: usize,
    pub moves: usize,
}

impl OpStats {
    pub fn total(&self) -> usize {
        self.creates + self.removes + self.moves
    }
}

pub fn op_stats(ops: &[Operation]) -> OpStats {
    ops.iter().fold(OpStats::default(), |mut acc, op| {
        match op {
            Operation::Create(_) => acc.creates += 1,
            Operation::Remove { .. } => acc.removes += 1,
            Operation::Move { .. } => acc.moves += 1,
        }
        acc
    })
}

/// Result of reconciling one parent's children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelPlan {
    /// Operations for this level, in replay order
    pub operations: Vec<Operation>,
    /// Vanished blocks whose subtree still holds blocks needed elsewhere.
    /// They keep their slot in the sibling list; the caller must
    /// emit their removal once those blocks have been moved out.
    pub deferred_removals: Vec<Uid>,
}

// ── Target snapshot index ─────────────────────────────────────────────

/// uid → row and parent → ordered children lookups over the target rows
struct TargetIndex<'a> {
    by_uid: HashMap<&'a str, &'a FlatBlock>,
    /// Children of the parentless top level
    top: Vec<&'a FlatBlock>,
    children: HashMap<&'a str, Vec<&'a FlatBlock>>,
}

impl<'a> TargetIndex<'a> {
    fn new(rows: &'a [FlatBlock]) -> Self {
        let mut by_uid = HashMap::with_capacity(rows.len());
        let mut top = Vec::new();
        let mut children: HashMap<&'a str, Vec<&'a FlatBlock>> = HashMap::new();
        for row in rows {
            by_uid.insert(row.uid.as_str(), row);
            match row.parent_uid.as_deref() {
                Some(parent) => children.entry(parent).or_default().push(row),
                None => top.push(row),
            }
        }
        top.sort_by_key(|row| row.order);
        for list in children.values_mut() {
            list.sort_by_key(|row| row.order);
        }
        Self {
            by_uid,
            top,
            children,
        }
    }

    fn contains(&self, uid: &str) -> bool {
        self.by_uid.contains_key(uid)
    }

    fn depth_of(&self, uid: &str) -> Option<usize> {
        self.by_uid.get(uid).map(|row| row.depth)
    }

    fn children_of(&self, parent: Option<&str>) -> &[&'a FlatBlock] {
        match parent {
            None => self.top.as_slice(),
            Some(uid) => match self.children.get(uid) {
                Some(list) => list.as_slice(),
                None => &[],
            },
        }
    }
}

// ── Working array helpers ─────────────────────────────────────────────

/// Children of `parent` in the working array, in sibling order
fn siblings(working: &[FlatBlock], parent: Option<&str>) -> Vec<Uid> {
    let mut rows: Vec<&FlatBlock> = working.iter().filter(|r| r.parent() == parent).collect();
    rows.sort_by_key(|r| r.order);
    rows.into_iter().map(|r| r.uid.clone()).collect()
}

/// parent uid → child uids of the working array
fn child_map(working: &[FlatBlock]) -> HashMap<&str, Vec<&str>> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for row in working {
        if let Some(parent) = row.parent() {
            children.entry(parent).or_default().push(row.uid.as_str());
        }
    }
    children
}

/// `uid` followed by all of its descendants
fn subtree_uids(children: &HashMap<&str, Vec<&str>>, uid: &str) -> Vec<Uid> {
    let mut out = vec![Uid::from(uid)];
    let mut i = 0;
    while i < out.len() {
        if let Some(kids) = children.get(out[i].as_str()) {
            out.extend(kids.iter().map(|k| Uid::from(*k)));
        }
        i += 1;
    }
    out
}

/// Insert `uid` right after `anchor` in a live sibling list, or at the
/// front without one. Returns the index it landed on.
fn place_after(live: &mut Vec<Uid>, anchor: Option<&str>, uid: Uid) -> usize {
    let at = anchor
        .and_then(|a| live.iter().position(|u| u == a))
        .map_or(0, |i| i + 1);
    live.insert(at, uid);
    at
}

fn ensure_unique(rows: &[FlatBlock], snapshot: &'static str) -> Result<(), ReconcileError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.uid.as_str()) {
            warn!(uid = %row.uid, snapshot, "duplicate uid in snapshot");
            return Err(ReconcileError::DuplicateUid(row.uid.clone(), snapshot));
        }
    }
    Ok(())
}

// ── Level reconciler ──────────────────────────────────────────────────

/// Reconcile the children of one parent.
///
/// `working` is the scratch flat array of the current state and is kept
/// in step with the store: removed subtrees are dropped, created blocks
/// appended, relocated blocks re-tagged and flagged `has_moved`, and the
/// sibling `order`s renumbered to their live positions.
pub fn reconcile_level(
    working: &mut Vec<FlatBlock>,
    target: &[FlatBlock],
    parent_uid: Option<&str>,
    depth: usize,
) -> Result<LevelPlan, ReconcileError> {
    let index = TargetIndex::new(target);
    reconcile_parent(working, &index, parent_uid, depth)
}

fn reconcile_parent(
    working: &mut Vec<FlatBlock>,
    target: &TargetIndex<'_>,
    parent: Option<&str>,
    depth: usize,
) -> Result<LevelPlan, ReconcileError> {
    let wanted = target.children_of(parent);
    let wanted_set: HashSet<&str> = wanted.iter().map(|row| row.uid.as_str()).collect();
    let parent_uid = parent.map(Uid::from);

    let mut operations = Vec::new();
    let mut deferred_removals = Vec::new();

    // Deletions. A sibling that is wanted somewhere else, or whose subtree
    // still holds wanted blocks, keeps its slot until it departs.
    let mut live: Vec<Uid> = Vec::new();
    let mut doomed: HashSet<Uid> = HashSet::new();
    {
        let children = child_map(working);
        for uid in siblings(working, parent) {
            if wanted_set.contains(uid.as_str()) {
                live.push(uid);
            } else if target.contains(&uid) {
                trace!(%uid, ?parent, "sibling relocates elsewhere");
                live.push(uid);
            } else {
                let subtree = subtree_uids(&children, &uid);
                if subtree.iter().any(|u| target.contains(u)) {
                    trace!(%uid, ?parent, "removal deferred until survivors move out");
                    deferred_removals.push(uid.clone());
                    live.push(uid);
                } else {
                    trace!(%uid, ?parent, "remove");
                    doomed.extend(subtree);
                    operations.push(Operation::Remove { uid });
                }
            }
        }
    }
    if !doomed.is_empty() {
        working.retain(|row| !doomed.contains(&row.uid));
    }

    let mut row_at: HashMap<Uid, usize> = working
        .iter()
        .enumerate()
        .map(|(i, row)| (row.uid.clone(), i))
        .collect();

    // Reorder the residents that stay. Departing siblings keep their slots
    // in the live list, so each move lands right after its predecessor.
    let mut staying: Vec<Uid> = live
        .iter()
        .filter(|uid| wanted_set.contains(uid.as_str()))
        .cloned()
        .collect();
    let resident: HashSet<Uid> = staying.iter().cloned().collect();
    let goal: Vec<Uid> = wanted
        .iter()
        .filter(|row| resident.contains(&row.uid))
        .map(|row| row.uid.clone())
        .collect();

    for (from, to) in minimal_moves(&staying, &goal)? {
        let uid = staying[from].clone();
        relocate(&mut staying, from, to);
        if let Some(i) = live.iter().position(|u| *u == uid) {
            live.remove(i);
        }
        let anchor = to.checked_sub(1).map(|p| staying[p].as_str());
        let order = place_after(&mut live, anchor, uid.clone());
        trace!(%uid, order, ?parent, "reorder");
        operations.push(Operation::Move {
            uid,
            order,
            parent_uid: parent_uid.clone(),
        });
    }

    // Arrivals go in ascending target index, each right after the block
    // that precedes it in the target, so none is ever moved twice.
    for (index, row) in wanted.iter().enumerate() {
        if resident.contains(&row.uid) {
            continue;
        }
        let anchor = index.checked_sub(1).map(|p| wanted[p].uid.as_str());
        let order = place_after(&mut live, anchor, row.uid.clone());
        match row_at.get(&row.uid).copied() {
            Some(i) => {
                let existing = &mut working[i];
                existing.parent_uid = parent_uid.clone();
                existing.depth = depth;
                existing.has_moved = true;
                trace!(uid = %row.uid, order, ?parent, "relocate");
                operations.push(Operation::Move {
                    uid: row.uid.clone(),
                    order,
                    parent_uid: parent_uid.clone(),
                });
            }
            None => {
                let block = FlatBlock {
                    parent_uid: parent_uid.clone(),
                    depth,
                    order,
                    has_moved: false,
                    ..(*row).clone()
                };
                trace!(uid = %block.uid, order, ?parent, "create");
                row_at.insert(block.uid.clone(), working.len());
                working.push(block.clone());
                operations.push(Operation::Create(block));
            }
        }
    }

    for (i, uid) in live.iter().enumerate() {
        if let Some(&at) = row_at.get(uid) {
            working[at].order = i;
        }
    }

    Ok(LevelPlan {
        operations,
        deferred_removals,
    })
}

// ── Tree reconciler ───────────────────────────────────────────────────

/// Parents whose children are reconciled at `depth`: the container at
/// depth 0, otherwise blocks that sit at `depth - 1` in the target and
/// have children on either side.
fn parents_at(
    working: &[FlatBlock],
    target_rows: &[FlatBlock],
    target: &TargetIndex<'_>,
    root: Option<&str>,
    depth: usize,
) -> Vec<Option<Uid>> {
    if depth == 0 {
        return vec![root.map(Uid::from)];
    }

    let mut seen = HashSet::new();
    let mut parents = Vec::new();
    let current = working.iter().filter(|r| r.depth == depth);
    let wanted = target_rows.iter().filter(|r| r.depth == depth);
    for parent in current.chain(wanted).filter_map(FlatBlock::parent) {
        if target.depth_of(parent) != Some(depth - 1) {
            continue;
        }
        if seen.insert(parent) {
            parents.push(Some(Uid::from(parent)));
        }
    }
    parents
}

/// Operations turning `a` into `b`, top-level blocks parentless.
pub fn reconcile(a: &[Block], b: &[Block]) -> Result<Vec<Operation>, ReconcileError> {
    reconcile_with(a, b, &ReconcileConfig::default())
}

/// Operations turning `a` into `b`.
///
/// Walks depths top-down. At each depth every parent that already sits at
/// its final location gets its children reconciled, so a block is always
/// positioned after its parent exists and is in place. The working array
/// is rebuilt (unflatten, then flatten) after each depth so that depth
/// tags follow the relocations made so far. Removals deferred by a level
/// are appended at the end, after every block they contained has moved
/// out.
pub fn reconcile_with(
    a: &[Block],
    b: &[Block],
    config: &ReconcileConfig,
) -> Result<Vec<Operation>, ReconcileError> {
    let root = config.root();
    let mut working = flatten(a, 0, root);
    let target_rows = flatten(b, 0, root);

    if config.validate {
        ensure_unique(&working, "current")?;
        ensure_unique(&target_rows, "target")?;
    }

    let target = TargetIndex::new(&target_rows);
    let last_depth = max_depth(&target_rows).map_or(0, |d| d + 1);
    debug!(
        current = working.len(),
        target = target_rows.len(),
        last_depth,
        "reconciling block trees"
    );

    let mut operations = Vec::new();
    let mut deferred = Vec::new();
    for depth in 0..=last_depth {
        let parents = parents_at(&working, &target_rows, &target, root, depth);
        let before = operations.len();
        for parent in &parents {
            let plan = reconcile_parent(&mut working, &target, parent.as_deref(), depth)?;
            operations.extend(plan.operations);
            deferred.extend(plan.deferred_removals);
        }
        debug!(
            depth,
            parents = parents.len(),
            ops = operations.len() - before,
            "level reconciled"
        );

        working = flatten(&unflatten(&working), 0, root);
    }

    operations.extend(deferred.into_iter().map(|uid| Operation::Remove { uid }));

    let stats = op_stats(&operations);
    debug!(
        creates = stats.creates,
        removes = stats.removes,
        moves = stats.moves,
        "reconciliation done"
    );
    Ok(operations)
}

// ── Simple compare ────────────────────────────────────────────────────

/// Additions and content edits between two snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleDiff {
    /// Blocks only in `b`, shallowest first
    pub new_blocks: Vec<FlatBlock>,
    /// Blocks in both whose content differs, carrying `b`'s content
    pub updated_blocks: Vec<FlatBlock>,
}

/// Cheap comparison for when `a`'s blocks are a subset of `b`'s.
///
/// No removals or moves are computed. Parents come before their children
/// in `new_blocks`, so they can be created in sequence.
pub fn simple_compare(a: &[Block], b: &[Block]) -> SimpleDiff {
    let rows_a = flatten(a, 0, None);
    let rows_b = flatten(b, 0, None);
    let by_uid: HashMap<&str, &FlatBlock> = rows_a.iter().map(|r| (r.uid.as_str(), r)).collect();

    let mut new_blocks: Vec<FlatBlock> = rows_b
        .iter()
        .filter(|r| !by_uid.contains_key(r.uid.as_str()))
        .cloned()
        .collect();
    new_blocks.sort_by_key(|r| r.depth);

    let updated_blocks = rows_b
        .iter()
        .filter(|r| {
            by_uid
                .get(r.uid.as_str())
                .is_some_and(|old| old.content != r.content)
        })
        .cloned()
        .collect();

    SimpleDiff {
        new_blocks,
        updated_blocks,
    }
}
