use core::iter::FusedIterator;

use crate::{links, value, AvlTree, Dir, Link};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// An iterator over the elements of an [`AvlTree`] in ascending order.
///
/// Created by [`AvlTree::iter`].
pub struct Iter<'tree, T> {
    tree: &'tree AvlTree<T>,

    front_cur: Link<T>,
    front_from: CameFrom,

    len: usize,
}

impl<'tree, T> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree AvlTree<T>) -> Self {
        Iter {
            tree,

            front_cur: tree.root,
            front_from: CameFrom::Parent,
            len: tree.len(),
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let mut cur = self.front_cur?;

        loop {
            match self.front_from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    while let Some(left) = unsafe { links(cur).left() } {
                        cur = left;
                    }

                    // Once the minimum is found, its (empty) left subtree has been exhausted.
                    self.front_from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up next. Save off the
                    // iterator state and return it.
                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::Here;
                    self.len -= 1;

                    return Some(unsafe { value(cur) });
                }

                CameFrom::Here => {
                    // The current node was just yielded. Enter its right subtree if there is
                    // one; otherwise the whole subtree rooted here is exhausted.
                    match unsafe { links(cur).right() } {
                        Some(right) => {
                            self.front_from = CameFrom::Parent;
                            cur = right;
                        }
                        None => self.front_from = CameFrom::RightChild,
                    }
                }

                CameFrom::RightChild => {
                    // The subtree rooted at `cur` is exhausted. Ascend until arriving from a
                    // left child: that parent is the successor.
                    loop {
                        let parent = unsafe { links(cur).parent() }
                            .expect("iterator ran past the maximum element");
                        let dir = unsafe { self.tree.which_child(parent, cur) };
                        cur = parent;

                        if dir == Dir::Left {
                            break;
                        }
                    }

                    self.front_from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

// SAFETY: `Iter` only reads the tree through a shared borrow.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// An owning iterator over the elements of an [`AvlTree`] in ascending order.
///
/// Created by the [`IntoIterator`] implementation of [`AvlTree`].
pub struct IntoIter<T> {
    tree: AvlTree<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(tree: AvlTree<T>) -> Self {
        IntoIter { tree }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.tree.pop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
