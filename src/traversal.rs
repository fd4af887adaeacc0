//! Depth-first traversals.

use crate::{links, value, AvlTree, Link};

/// The order in which a depth-first traversal visits the elements of a tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Order {
    /// Each node is visited before its left subtree, then its right subtree.
    PreOrder,
    /// Each node is visited after its left subtree and before its right subtree.
    ///
    /// This visits the elements of a binary search tree in ascending order.
    InOrder,
    /// Each node is visited after both its subtrees.
    PostOrder,
}

impl<T> AvlTree<T> {
    /// Calls `visit` on every element of the tree, in the given `order`.
    ///
    /// Traversal recurses once per level of the tree, which is _O(log(n))_ deep.
    pub fn traverse<F>(&self, order: Order, mut visit: F)
    where
        F: FnMut(&T),
    {
        unsafe { traverse_at(self.root, order, &mut visit) }
    }

    /// Calls `visit` on every element of the tree in pre-order.
    pub fn pre_order<F: FnMut(&T)>(&self, visit: F) {
        self.traverse(Order::PreOrder, visit);
    }

    /// Calls `visit` on every element of the tree in ascending order.
    pub fn in_order<F: FnMut(&T)>(&self, visit: F) {
        self.traverse(Order::InOrder, visit);
    }

    /// Calls `visit` on every element of the tree in post-order.
    pub fn post_order<F: FnMut(&T)>(&self, visit: F) {
        self.traverse(Order::PostOrder, visit);
    }
}

unsafe fn traverse_at<T, F>(link: Link<T>, order: Order, visit: &mut F)
where
    F: FnMut(&T),
{
    let Some(node) = link else {
        return;
    };

    unsafe {
        let (left, right) = (links(node).left(), links(node).right());

        if order == Order::PreOrder {
            visit(value(node));
        }

        traverse_at(left, order, visit);

        if order == Order::InOrder {
            visit(value(node));
        }

        traverse_at(right, order, visit);

        if order == Order::PostOrder {
            visit(value(node));
        }
    }
}

/// A binary search tree over a totally ordered element type.
///
/// Duplicate elements are not allowed: adding an element equal to one already in the tree does
/// nothing.
pub trait BinarySearchTree<T: Ord> {
    /// Adds `t` to the tree, unless an equal element is already present.
    fn add(&mut self, t: T);

    /// Returns `true` if the tree contains an element equal to `t`.
    fn contains(&self, t: &T) -> bool;

    /// Removes the element equal to `t`, returning whether one was removed.
    fn remove(&mut self, t: &T) -> bool;

    /// Applies `visit` to each element in pre-order.
    fn pre_order_traversal(&self, visit: &mut dyn FnMut(&T));

    /// Applies `visit` to each element in ascending order.
    fn in_order_traversal(&self, visit: &mut dyn FnMut(&T));

    /// Applies `visit` to each element in post-order.
    fn post_order_traversal(&self, visit: &mut dyn FnMut(&T));
}

impl<T: Ord> BinarySearchTree<T> for AvlTree<T> {
    fn add(&mut self, t: T) {
        self.insert(t);
    }

    fn contains(&self, t: &T) -> bool {
        AvlTree::contains(self, t)
    }

    fn remove(&mut self, t: &T) -> bool {
        AvlTree::remove(self, t)
    }

    fn pre_order_traversal(&self, visit: &mut dyn FnMut(&T)) {
        self.traverse(Order::PreOrder, visit);
    }

    fn in_order_traversal(&self, visit: &mut dyn FnMut(&T)) {
        self.traverse(Order::InOrder, visit);
    }

    fn post_order_traversal(&self, visit: &mut dyn FnMut(&T)) {
        self.traverse(Order::PostOrder, visit);
    }
}
