use core::ptr::NonNull;

use thiserror::Error;

use crate::{links, AvlTree, Dir, Node};

/// A broken structural invariant of an [`AvlTree`].
///
/// Returned by [`AvlTree::check_invariants`]. Depths count from 0 at the root.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("the root has a parent link")]
    RootHasParent,

    #[error("node at depth {depth} does not link back to its parent")]
    ParentLink { depth: usize },

    #[error("node at depth {depth} caches height {cached}, but its subtree has height {actual}")]
    StaleHeight {
        depth: usize,
        cached: usize,
        actual: usize,
    },

    #[error("node at depth {depth} has balance factor {balance}")]
    Unbalanced { depth: usize, balance: isize },

    #[error("element {position} in ascending order is not greater than the one before it")]
    OutOfOrder { position: usize },

    #[error("tree reports {len} elements, but {reachable} are reachable from the root")]
    LenMismatch { len: usize, reachable: usize },
}

impl<T: Ord> AvlTree<T> {
    /// Checks every structural invariant of the tree, returning the first violation found.
    ///
    /// This walks the whole tree and completes in _O(n)_ time.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let reachable = match self.root {
            None => 0,
            Some(root) => {
                if unsafe { links(root).parent() }.is_some() {
                    return Err(InvariantViolation::RootHasParent);
                }

                unsafe { self.check_subtree(root, 0)? }.1
            }
        };

        if reachable != self.len {
            return Err(InvariantViolation::LenMismatch {
                len: self.len,
                reachable,
            });
        }

        // Strictly ascending in-order elements imply both search order and the absence of
        // duplicates.
        let mut prev = None;
        for (position, value) in self.iter().enumerate() {
            if prev.is_some_and(|prev| prev >= value) {
                return Err(InvariantViolation::OutOfOrder { position });
            }

            prev = Some(value);
        }

        Ok(())
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("AVL tree invariant violated: {violation}");
        }
    }

    // Returns the structural height and the number of nodes of the subtree rooted at `node`.
    unsafe fn check_subtree(
        &self,
        node: NonNull<Node<T>>,
        depth: usize,
    ) -> Result<(usize, usize), InvariantViolation> {
        let mut heights = [0; 2];
        let mut count = 1;

        for dir in [Dir::Left, Dir::Right] {
            let Some(child) = (unsafe { links(node).child(dir) }) else {
                continue;
            };

            // Ensure child's parent link points to this node.
            if unsafe { links(child).parent() } != Some(node) {
                return Err(InvariantViolation::ParentLink { depth: depth + 1 });
            }

            let (height, subtree_len) = unsafe { self.check_subtree(child, depth + 1)? };
            heights[dir as usize] = height;
            count += subtree_len;
        }

        let actual = 1 + heights[0].max(heights[1]);
        let cached = usize::from(unsafe { links(node).height() });
        if cached != actual {
            return Err(InvariantViolation::StaleHeight {
                depth,
                cached,
                actual,
            });
        }

        let balance = heights[0] as isize - heights[1] as isize;
        if !(-1..=1).contains(&balance) {
            return Err(InvariantViolation::Unbalanced { depth, balance });
        }

        Ok((actual, count))
    }
}
