//! Nested ⇄ flat conversion
//!
//! [`flatten`] tags every block with its depth and parent uid so that two
//! snapshots can be compared level by level; [`unflatten`] rebuilds the
//! nested form. The pair is lossless up to sibling `order` ties, which are
//! broken by input position.
//!
//! Author: Moroya Sakamoto

use std::collections::HashMap;

use crate::block::{Block, FlatBlock};

/// Flatten a forest into one [`FlatBlock`] per block.
///
/// Top-level blocks get `depth` and `parent_uid`; their descendants get
/// `depth + 1`, `depth + 2`, … and the uid of their containing block.
/// Output is pre-order, but callers must not rely on that: structure lives
/// in the tags, not in the sequence.
pub fn flatten(blocks: &[Block], depth: usize, parent_uid: Option<&str>) -> Vec<FlatBlock> {
    let mut out = Vec::new();
    flatten_into(blocks, depth, parent_uid, &mut out);
    out
}

fn flatten_into(
    blocks: &[Block],
    depth: usize,
    parent_uid: Option<&str>,
    out: &mut Vec<FlatBlock>,
) {
    for block in blocks {
        out.push(FlatBlock::from_block(block, depth, parent_uid));
        flatten_into(&block.children, depth + 1, Some(block.uid.as_str()), out);
    }
}

/// Rebuild the nested form from a flat sequence, starting at depth 0.
pub fn unflatten(flat: &[FlatBlock]) -> Vec<Block> {
    unflatten_at(flat, 0)
}

/// Rebuild the nested form, taking the blocks at `depth` as the top level.
///
/// Each top-level block collects as children every flat block whose
/// `parent_uid` equals its uid, recursively. Below the top level the
/// `depth` tags are not consulted, so rows whose ancestors were relocated
/// (and whose tags are therefore stale) still land in the right place.
/// Siblings are sorted by `order`; a block with no children gets an empty
/// `children` vec.
pub fn unflatten_at(flat: &[FlatBlock], depth: usize) -> Vec<Block> {
    let mut by_parent: HashMap<&str, Vec<&FlatBlock>> = HashMap::new();
    for row in flat {
        if let Some(parent) = row.parent() {
            by_parent.entry(parent).or_default().push(row);
        }
    }

    let top: Vec<&FlatBlock> = flat.iter().filter(|row| row.depth == depth).collect();
    build_level(top, &by_parent)
}

fn build_level(mut rows: Vec<&FlatBlock>, by_parent: &HashMap<&str, Vec<&FlatBlock>>) -> Vec<Block> {
    rows.sort_by_key(|row| row.order);
    rows.into_iter()
        .map(|row| {
            let mut block = row.to_block();
            if let Some(children) = by_parent.get(row.uid.as_str()) {
                block.children = build_level(children.clone(), by_parent);
            }
            block
        })
        .collect()
}

/// Deepest `depth` tag in a flat sequence, `None` when empty
pub fn max_depth(flat: &[FlatBlock]) -> Option<usize> {
    flat.iter().map(|row| row.depth).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::normalize_tree;

    fn sample() -> Vec<Block> {
        vec![
            Block::new("a", 0, "A").with_children(vec![
                Block::new("a1", 0, "A1").with_child(Block::new("a1x", 0, "deep")),
                Block::new("a2", 1, "A2"),
            ]),
            Block::new("b", 1, "B"),
        ]
    }

    #[test]
    fn test_flatten_tags_depth_and_parent() {
        let flat = flatten(&sample(), 0, None);
        assert_eq!(flat.len(), 5);

        let find = |uid: &str| flat.iter().find(|f| f.uid == uid).unwrap();
        assert_eq!(find("a").depth, 0);
        assert_eq!(find("a").parent(), None);
        assert_eq!(find("a1").parent(), Some("a"));
        assert_eq!(find("a1x").depth, 2);
        assert_eq!(find("a1x").parent(), Some("a1"));
        assert_eq!(find("b").depth, 0);
    }

    #[test]
    fn test_flatten_empty_is_empty() {
        assert!(flatten(&[], 0, None).is_empty());
    }

    #[test]
    fn test_flatten_with_container_parent() {
        let flat = flatten(&sample(), 0, Some("page"));
        let top: Vec<_> = flat.iter().filter(|f| f.depth == 0).collect();
        assert!(top.iter().all(|f| f.parent() == Some("page")));
        // Nested blocks still point at their block parent
        assert!(flat.iter().any(|f| f.uid == "a1" && f.parent() == Some("a")));
    }

    #[test]
    fn test_flatten_custom_start_depth() {
        let flat = flatten(&sample(), 3, Some("x"));
        assert_eq!(flat.iter().map(|f| f.depth).min(), Some(3));
        assert_eq!(max_depth(&flat), Some(5));
    }

    #[test]
    fn test_roundtrip_preserves_structure() {
        let tree = sample();
        let back = unflatten(&flatten(&tree, 0, None));
        assert_eq!(normalize_tree(&back), normalize_tree(&tree));
    }

    #[test]
    fn test_unflatten_sorts_by_order() {
        let tree = vec![Block::new("late", 5, ""), Block::new("early", 1, "")];
        let back = unflatten(&flatten(&tree, 0, None));
        assert_eq!(back[0].uid, "early");
        assert_eq!(back[1].uid, "late");
    }

    #[test]
    fn test_unflatten_leaf_has_no_children() {
        let back = unflatten(&flatten(&sample(), 0, None));
        assert!(back[1].children.is_empty());
    }

    #[test]
    fn test_unflatten_ignores_stale_depth_below_top() {
        let mut flat = flatten(&sample(), 0, None);
        // Pretend a1's subtree was re-parented without rewriting its tags
        for row in flat.iter_mut().filter(|r| r.uid == "a1x") {
            row.depth = 9;
        }
        let back = unflatten(&flat);
        assert_eq!(back[0].children[0].children[0].uid, "a1x");
    }

    #[test]
    fn test_max_depth_empty() {
        assert_eq!(max_depth(&[]), None);
    }
}
