//! Block store interface and in-memory reference store
//!
//! [`BlockStore`] is the mutation surface of a remote outline store:
//! create, move, update and remove single blocks. [`MemoryStore`]
//! implements it in memory with the same positional semantics, which is
//! what replayed operation lists are checked against.
//!
//! Author: Moroya Sakamoto

use std::collections::HashMap;

use tracing::trace;

use crate::block::{normalize_tree, tree_len, Attrs, Block, FlatBlock, Uid};
use crate::diff::Operation;
use crate::error::StoreError;

/// Node-level mutation API of an outline store.
///
/// `order` is a positional index among the destination's children; values
/// past the end append.
pub trait BlockStore {
    /// Create `block` under `parent_uid` at `order`
    fn create(
        &mut self,
        block: &FlatBlock,
        parent_uid: Option<&str>,
        order: usize,
    ) -> Result<(), StoreError>;

    /// Detach `uid` (with its subtree) and insert it under `parent_uid` at `order`
    fn move_block(&mut self, uid: &str, parent_uid: Option<&str>, order: usize)
        -> Result<(), StoreError>;

    /// Replace the content string of `uid`
    fn update(&mut self, uid: &str, content: &str) -> Result<(), StoreError>;

    /// Remove `uid` and its whole subtree
    fn remove(&mut self, uid: &str) -> Result<(), StoreError>;
}

/// Replay `ops` strictly in order, stopping at the first rejected one
pub fn apply_operations<S>(store: &mut S, ops: &[Operation]) -> Result<(), StoreError>
where
    S: BlockStore + ?Sized,
{
    for op in ops {
        match op {
            Operation::Create(block) => store.create(block, block.parent(), block.order)?,
            Operation::Remove { uid } => store.remove(uid)?,
            Operation::Move {
                uid,
                order,
                parent_uid,
            } => store.move_block(uid, parent_uid.as_deref(), *order)?,
        }
    }
    Ok(())
}

/// Stored block (children kept as an ordered uid list)
#[derive(Debug, Clone)]
struct Entry {
    content: String,
    attrs: Attrs,
    parent: Option<Uid>,
    children: Vec<Uid>,
}

/// In-memory outline store (O(1) lookup via HashMap)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Container uid top-level blocks hang off, if any
    root: Option<Uid>,
    /// Top-level block order
    top: Vec<Uid>,
    blocks: HashMap<Uid, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store whose top level is the container `root`
    pub fn with_root(root: &str) -> Self {
        Self {
            root: Some(Uid::from(root)),
            ..Self::default()
        }
    }

    /// Load a snapshot. Siblings are stored in `order` order.
    pub fn from_tree(blocks: &[Block], root: Option<&str>) -> Result<Self, StoreError> {
        let tree = normalize_tree(blocks);
        let mut store = Self {
            root: root.map(Uid::from),
            top: Vec::with_capacity(tree.len()),
            blocks: HashMap::with_capacity(tree_len(&tree)),
        };
        store.load(&tree, None)?;
        Ok(store)
    }

    fn load(&mut self, blocks: &[Block], parent: Option<&str>) -> Result<(), StoreError> {
        for block in blocks {
            let row = FlatBlock::from_block(block, 0, parent);
            self.create(&row, parent, usize::MAX)?;
            self.load(&block.children, Some(block.uid.as_str()))?;
        }
        Ok(())
    }

    /// Current state as a nested snapshot, `order` = positional index
    pub fn to_tree(&self) -> Vec<Block> {
        self.build(&self.top)
    }

    fn build(&self, uids: &[Uid]) -> Vec<Block> {
        uids.iter()
            .enumerate()
            .filter_map(|(i, uid)| {
                let entry = self.blocks.get(uid)?;
                Some(Block {
                    uid: uid.clone(),
                    order: i,
                    content: entry.content.clone(),
                    children: self.build(&entry.children),
                    attrs: entry.attrs.clone(),
                })
            })
            .collect()
    }

    /// Total stored blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.blocks.contains_key(uid)
    }

    pub fn content(&self, uid: &str) -> Option<&str> {
        self.blocks.get(uid).map(|e| e.content.as_str())
    }

    /// Parent block of `uid`; `None` for top-level or unknown blocks
    pub fn parent_of(&self, uid: &str) -> Option<&str> {
        self.blocks.get(uid)?.parent.as_deref()
    }

    /// Ordered children of `parent` (`None` or the container for the top level)
    pub fn children_of(&self, parent: Option<&str>) -> Option<&[Uid]> {
        match self.resolve(parent) {
            None => Some(self.top.as_slice()),
            Some(p) => self.blocks.get(p).map(|e| e.children.as_slice()),
        }
    }

    /// Map the container uid onto the top level
    fn resolve<'a>(&self, parent: Option<&'a str>) -> Option<&'a str> {
        match parent {
            Some(p) if self.root.as_deref() == Some(p) => None,
            other => other,
        }
    }

    fn list_mut(&mut self, parent: Option<&str>) -> Result<&mut Vec<Uid>, StoreError> {
        match self.resolve(parent) {
            None => Ok(&mut self.top),
            Some(p) => self
                .blocks
                .get_mut(p)
                .map(|e| &mut e.children)
                .ok_or_else(|| StoreError::UnknownParent(Uid::from(p))),
        }
    }

    fn detach(&mut self, uid: &str) -> Result<(), StoreError> {
        let parent = self
            .blocks
            .get(uid)
            .ok_or_else(|| StoreError::UnknownBlock(Uid::from(uid)))?
            .parent
            .clone();
        let list = self.list_mut(parent.as_deref())?;
        list.retain(|c| c != uid);
        Ok(())
    }

    /// True if `ancestor` is `uid` itself or above it
    fn is_ancestor_or_self(&self, ancestor: &str, uid: &str) -> bool {
        let mut cursor = Some(uid);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }
}

impl BlockStore for MemoryStore {
    fn create(
        &mut self,
        block: &FlatBlock,
        parent_uid: Option<&str>,
        order: usize,
    ) -> Result<(), StoreError> {
        if self.blocks.contains_key(&block.uid) {
            return Err(StoreError::DuplicateBlock(block.uid.clone()));
        }
        let parent = self.resolve(parent_uid).map(Uid::from);
        let list = self.list_mut(parent.as_deref())?;
        let at = order.min(list.len());
        list.insert(at, block.uid.clone());
        self.blocks.insert(
            block.uid.clone(),
            Entry {
                content: block.content.clone(),
                attrs: block.attrs.clone(),
                parent,
                children: Vec::new(),
            },
        );
        trace!(uid = %block.uid, ?parent_uid, order = at, "store create");
        Ok(())
    }

    fn move_block(
        &mut self,
        uid: &str,
        parent_uid: Option<&str>,
        order: usize,
    ) -> Result<(), StoreError> {
        if !self.blocks.contains_key(uid) {
            return Err(StoreError::UnknownBlock(Uid::from(uid)));
        }
        let parent = self.resolve(parent_uid).map(Uid::from);
        if let Some(p) = parent.as_deref() {
            if !self.blocks.contains_key(p) {
                return Err(StoreError::UnknownParent(Uid::from(p)));
            }
            if self.is_ancestor_or_self(uid, p) {
                return Err(StoreError::CyclicMove {
                    uid: Uid::from(uid),
                    parent: Uid::from(p),
                });
            }
        }

        self.detach(uid)?;
        let list = self.list_mut(parent.as_deref())?;
        let at = order.min(list.len());
        list.insert(at, Uid::from(uid));
        if let Some(entry) = self.blocks.get_mut(uid) {
            entry.parent = parent;
        }
        trace!(%uid, ?parent_uid, order = at, "store move");
        Ok(())
    }

    fn update(&mut self, uid: &str, content: &str) -> Result<(), StoreError> {
        let entry = self
            .blocks
            .get_mut(uid)
            .ok_or_else(|| StoreError::UnknownBlock(Uid::from(uid)))?;
        entry.content = String::from(content);
        trace!(%uid, "store update");
        Ok(())
    }

    fn remove(&mut self, uid: &str) -> Result<(), StoreError> {
        self.detach(uid)?;
        let mut stack = vec![Uid::from(uid)];
        while let Some(next) = stack.pop() {
            if let Some(entry) = self.blocks.remove(&next) {
                stack.extend(entry.children);
            }
        }
        trace!(%uid, "store remove");
        Ok(())
    }
}
