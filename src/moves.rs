//! Sibling reordering
//!
//! Computes the positional moves that turn one ordering of a set of
//! siblings into another. A move `(from, to)` takes the element at `from`
//! out of the sequence and re-inserts it at `to`, shifting everything in
//! between: the same semantics a block store applies when it is told to
//! place a block at a given `order`.
//!
//! Author: Moroya Sakamoto

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::ReconcileError;

/// `(from_index, to_index)`, applied sequentially
pub type Move = (usize, usize);

/// Moves that reorder `current` into `target`.
///
/// Both sequences must hold the same distinct elements; anything else is
/// rejected with [`ReconcileError::SequenceMismatch`] before any work is
/// done.
///
/// # Algorithm
///
/// Scan `target` left to right. At the first position `i` whose element
/// is not at index `i` of the working copy, emit `(current_index, i)`,
/// apply it to the working copy and restart the scan. Stop when a full
/// pass finds nothing out of place. Every move fixes one more prefix
/// position, so there are at most `len - 1` of them.
pub fn minimal_moves<T>(current: &[T], target: &[T]) -> Result<Vec<Move>, ReconcileError>
where
    T: Eq + Hash + Clone + core::fmt::Debug,
{
    check_same_elements(current, target)?;

    let mut work = current.to_vec();
    let mut moves = Vec::new();

    'scan: loop {
        for (i, wanted) in target.iter().enumerate() {
            let at = work.iter().position(|x| x == wanted).ok_or_else(|| {
                ReconcileError::SequenceMismatch(format!("{wanted:?} vanished mid-scan"))
            })?;
            if at != i {
                moves.push((at, i));
                relocate(&mut work, at, i);
                continue 'scan;
            }
        }
        break;
    }

    Ok(moves)
}

/// Take the element at `from` out and re-insert it at `to`
#[inline]
pub fn relocate<T>(seq: &mut Vec<T>, from: usize, to: usize) {
    let item = seq.remove(from);
    seq.insert(to, item);
}

/// Apply `moves` in order to a copy of `seq`
pub fn replay_moves<T: Clone>(seq: &[T], moves: &[Move]) -> Vec<T> {
    let mut out = seq.to_vec();
    for &(from, to) in moves {
        relocate(&mut out, from, to);
    }
    out
}

fn check_same_elements<T>(current: &[T], target: &[T]) -> Result<(), ReconcileError>
where
    T: Eq + Hash + core::fmt::Debug,
{
    if current.len() != target.len() {
        return Err(ReconcileError::SequenceMismatch(format!(
            "current has {} elements, target has {}",
            current.len(),
            target.len()
        )));
    }

    let mut seen = HashSet::with_capacity(current.len());
    for item in current {
        if !seen.insert(item) {
            return Err(ReconcileError::SequenceMismatch(format!(
                "{item:?} repeated in current"
            )));
        }
    }

    let mut matched = HashSet::with_capacity(target.len());
    for item in target {
        if !seen.contains(item) {
            return Err(ReconcileError::SequenceMismatch(format!(
                "{item:?} missing from current"
            )));
        }
        if !matched.insert(item) {
            return Err(ReconcileError::SequenceMismatch(format!(
                "{item:?} repeated in target"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_needs_no_moves() {
        let seq = ["a", "b", "c"];
        assert!(minimal_moves(&seq, &seq).unwrap().is_empty());
    }

    #[test]
    fn test_empty() {
        let empty: [&str; 0] = [];
        assert!(minimal_moves(&empty, &empty).unwrap().is_empty());
    }

    #[test]
    fn test_swap_is_one_move() {
        let moves = minimal_moves(&["1", "2"], &["2", "1"]).unwrap();
        assert_eq!(moves, vec![(1, 0)]);
    }

    #[test]
    fn test_move_to_front() {
        let moves = minimal_moves(&["a", "b", "c", "d"], &["d", "a", "b", "c"]).unwrap();
        assert_eq!(moves, vec![(3, 0)]);
    }

    #[test]
    fn test_reverse() {
        let current = ["a", "b", "c", "d"];
        let target = ["d", "c", "b", "a"];
        let moves = minimal_moves(&current, &target).unwrap();
        assert_eq!(moves.len(), 3);
        assert_eq!(replay_moves(&current, &moves), target.to_vec());
    }

    #[test]
    fn test_replay_reaches_target() {
        let current = [5, 3, 9, 1, 7, 2];
        let target = [1, 2, 3, 5, 7, 9];
        let moves = minimal_moves(&current, &target).unwrap();
        assert_eq!(replay_moves(&current, &moves), target.to_vec());
        assert!(moves.len() < current.len());
    }

    #[test]
    fn test_does_not_touch_caller_sequence() {
        let current = vec!["x", "y"];
        let _ = minimal_moves(&current, &["y", "x"]).unwrap();
        assert_eq!(current, vec!["x", "y"]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = minimal_moves(&["a"], &["a", "b"]).unwrap_err();
        assert!(matches!(err, ReconcileError::SequenceMismatch(_)));
    }

    #[test]
    fn test_missing_element_rejected() {
        let err = minimal_moves(&["a", "b"], &["a", "c"]).unwrap_err();
        assert!(matches!(err, ReconcileError::SequenceMismatch(_)));
    }

    #[test]
    fn test_duplicate_element_rejected() {
        assert!(minimal_moves(&["a", "a"], &["a", "a"]).is_err());
        assert!(minimal_moves(&["a", "b"], &["a", "a"]).is_err());
    }

    #[test]
    fn test_relocate_forward_and_back() {
        let mut v = vec![0, 1, 2, 3];
        relocate(&mut v, 0, 3);
        assert_eq!(v, vec![1, 2, 3, 0]);
        relocate(&mut v, 3, 0);
        assert_eq!(v, vec![0, 1, 2, 3]);
    }
}
