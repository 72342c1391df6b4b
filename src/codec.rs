//! JSON codec for snapshots and operation lists
//!
//! Snapshots are arrays of nested blocks (`uid`, `order`, `content` or the
//! legacy `string`, `children`, plus any extra attributes). Operation lists
//! use a `type` discriminator and a `parent-uid` key:
//!
//! ```json
//! [{ "type": "move", "uid": "b1", "order": 0, "parent-uid": "page" }]
//! ```
//!
//! Author: Moroya Sakamoto

use crate::block::Block;
use crate::diff::Operation;
use crate::error::CodecError;

// ── Snapshots ──────────────────────────────────────────────────────────

/// Parse a snapshot from a JSON array of blocks
pub fn decode_tree(json: &str) -> Result<Vec<Block>, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a snapshot as a JSON array of blocks
pub fn encode_tree(blocks: &[Block]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(blocks)?)
}

// ── Operation lists ───────────────────────────────────────────────────

/// Serialize an operation list in replay order
pub fn encode_operations(ops: &[Operation]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(ops)?)
}

/// Parse an operation list
pub fn decode_operations(json: &str) -> Result<Vec<Operation>, CodecError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Uid;
    use serde_json::json;

    #[test]
    fn test_decode_tree_with_attrs_and_children() {
        let raw = r#"[
            { "uid": "a", "order": 0, "content": "A", "open": true,
              "children": [ { "uid": "a1", "order": 0, "content": "A1" } ] },
            { "uid": "b", "order": 1 }
        ]"#;
        let tree = decode_tree(raw).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].attrs.get("open"), Some(&json!(true)));
        assert_eq!(tree[0].children[0].content, "A1");
        assert_eq!(tree[1].content, "");
    }

    #[test]
    fn test_tree_roundtrip() {
        let tree = vec![Block::new("a", 0, "x")
            .with_attr("heading", json!(1))
            .with_child(Block::new("b", 0, "y"))];
        let back = decode_tree(&encode_tree(&tree).unwrap()).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_decode_tree_rejects_garbage() {
        assert!(matches!(decode_tree("{not json"), Err(CodecError::Json(_))));
        assert!(decode_tree(r#"[{ "order": 0 }]"#).is_err());
    }

    #[test]
    fn test_decode_move_and_remove() {
        let raw = r#"[
            { "type": "move", "uid": "3", "order": 1, "parent-uid": "2" },
            { "type": "remove", "uid": "9" }
        ]"#;
        let ops = decode_operations(raw).unwrap();
        assert_eq!(
            ops,
            vec![
                Operation::Move {
                    uid: Uid::from("3"),
                    order: 1,
                    parent_uid: Some(Uid::from("2")),
                },
                Operation::Remove { uid: Uid::from("9") },
            ]
        );
    }

    #[test]
    fn test_encode_top_level_move_has_null_parent() {
        let ops = vec![Operation::Move {
            uid: Uid::from("1"),
            order: 0,
            parent_uid: None,
        }];
        let v: serde_json::Value = serde_json::from_str(&encode_operations(&ops).unwrap()).unwrap();
        assert_eq!(v, json!([{ "type": "move", "uid": "1", "order": 0, "parent-uid": null }]));
    }

    #[test]
    fn test_unknown_operation_type_rejected() {
        assert!(decode_operations(r#"[{ "type": "teleport", "uid": "1" }]"#).is_err());
    }
}
