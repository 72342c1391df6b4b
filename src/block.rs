//! Block tree representation
//!
//! Two views of the same outline: the nested [`Block`] form that callers
//! hand in, and the [`FlatBlock`] form where each block carries its depth
//! and parent uid explicitly. Attributes the engine does not interpret are
//! carried through verbatim.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable block identifier, unique across a whole snapshot
pub type Uid = String;

/// Opaque pass-through attributes (everything except the structural fields)
pub type Attrs = Map<String, Value>;

/// Block in nested form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub uid: Uid,
    /// Rank among siblings. Only used as a sort key; may be sparse.
    #[serde(default)]
    pub order: usize,
    #[serde(default, alias = "string")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
    #[serde(flatten)]
    pub attrs: Attrs,
}

impl Block {
    pub fn new(uid: &str, order: usize, content: &str) -> Self {
        Self {
            uid: Uid::from(uid),
            order,
            content: String::from(content),
            children: Vec::new(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(String::from(key), value);
        self
    }

    /// Number of blocks in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Block::subtree_len).sum::<usize>()
    }
}

/// Block in flat form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlatBlock {
    pub uid: Uid,
    /// Containing block, or the container/top-level sentinel (`None`)
    #[serde(rename = "parent-uid", default)]
    pub parent_uid: Option<Uid>,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub order: usize,
    #[serde(default, alias = "string")]
    pub content: String,
    #[serde(flatten)]
    pub attrs: Attrs,
    /// Set while reconciling when the block was relocated from another parent
    #[serde(skip)]
    pub has_moved: bool,
}

impl FlatBlock {
    /// Strip `children` off a nested block and tag it with its position
    pub fn from_block(block: &Block, depth: usize, parent_uid: Option<&str>) -> Self {
        Self {
            uid: block.uid.clone(),
            parent_uid: parent_uid.map(Uid::from),
            depth,
            order: block.order,
            content: block.content.clone(),
            attrs: block.attrs.clone(),
            has_moved: false,
        }
    }

    /// Nested block with no children
    pub fn to_block(&self) -> Block {
        Block {
            uid: self.uid.clone(),
            order: self.order,
            content: self.content.clone(),
            children: Vec::new(),
            attrs: self.attrs.clone(),
        }
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent_uid.as_deref()
    }
}

/// Canonical copy of a tree: siblings sorted by `order` (stable), and
/// `order` renumbered to the positional index. Two trees are isomorphic
/// exactly when their normalized forms are equal.
pub fn normalize_tree(blocks: &[Block]) -> Vec<Block> {
    let mut sorted: Vec<&Block> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.order);
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, b)| Block {
            uid: b.uid.clone(),
            order: i,
            content: b.content.clone(),
            children: normalize_tree(&b.children),
            attrs: b.attrs.clone(),
        })
        .collect()
}

/// Total block count of a forest
pub fn tree_len(blocks: &[Block]) -> usize {
    blocks.iter().map(Block::subtree_len).sum()
}
