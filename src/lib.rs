//! An AVL tree: a self-balancing binary search tree over any totally ordered element type.
//!
//! ```
//! use cordyceps_avl::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for i in 0..10 {
//!     tree.insert(i);
//! }
//!
//! assert_eq!(tree.len(), 10);
//! assert!(tree.height() <= 4);
//! assert!(tree.contains(&7));
//! assert!(tree.remove(&7));
//! assert!(!tree.contains(&7));
//!
//! let mut sorted = Vec::new();
//! tree.in_order(|&v| sorted.push(v));
//! assert_eq!(sorted, [0, 1, 2, 3, 4, 5, 6, 8, 9]);
//! ```

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing child has height 0, so a leaf has
//   height 1.
// - The balance factor of `x` is `b(x) = h(left(x)) - h(right(x))`.
// - The parent of a node `x` is denoted `p(x)`.
//
// The fundamental invariants of an AVL tree are:
// 1. `b(x) ∈ {-1, 0, 1}` for every node `x`.
// 2. `h(x) = 1 + max(h(left(x)), h(right(x)))`.
//
// Heights are cached in each node's links. Any structural change below `x` is followed by a walk
// from the lowest changed node to the root which refreshes `h` and restores (1) with at most two
// rotations per level.
//
// Corollary: a tree of `n` nodes has height at most `1.4405 log2(n + 2) - 0.328`.

use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomData, mem, ops::Not,
    ptr::NonNull,
};

use arbitrary::{Arbitrary, Unstructured};
use cordyceps::Linked;
use tracing::trace;

mod dotgraph;
mod invariants;
mod iter;
mod traversal;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use invariants::InvariantViolation;
pub use iter::{IntoIter, Iter};
pub use traversal::{BinarySearchTree, Order};

/// An ordered set based on an [AVL tree].
///
/// Every insertion and removal is followed by a bottom-up rebalance, so the height of the tree
/// stays logarithmic in its length regardless of the order in which elements arrive.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlTree<T> {
    root: Link<T>,
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

struct Node<T> {
    links: Links<T>,
    value: T,
}

struct Links<T> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: u8,
}

type Link<T> = Option<NonNull<Node<T>>>;

// The result of descending the tree in search of a key.
enum Search<T> {
    // A node with an equal key.
    Found(NonNull<Node<T>>),
    // The empty `dir` slot of `parent` where the key would be inserted.
    Vacant { parent: NonNull<Node<T>>, dir: Dir },
    // The tree has no root.
    Empty,
}

unsafe impl<T> Linked<Links<T>> for Node<T> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<T>> {
        let ptr = ptr.as_ptr();
        // SAFETY: `ptr` is non-null, and so is the address of any of its fields.
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<T> Node<T> {
    fn alloc(value: T) -> NonNull<Node<T>> {
        <Self as Linked<Links<T>>>::into_ptr(Box::new(Node {
            links: Links::new(),
            value,
        }))
    }

    // # Safety
    //
    // `ptr` must have come from `Node::alloc` and must no longer be linked into any tree.
    unsafe fn reclaim(ptr: NonNull<Node<T>>) -> Box<Node<T>> {
        unsafe { <Self as Linked<Links<T>>>::from_ptr(ptr) }
    }
}

#[inline]
unsafe fn links<'a, T>(node: NonNull<Node<T>>) -> &'a Links<T> {
    unsafe { <Node<T> as Linked<Links<T>>>::links(node).as_ref() }
}

#[inline]
unsafe fn links_mut<'a, T>(node: NonNull<Node<T>>) -> &'a mut Links<T> {
    unsafe { <Node<T> as Linked<Links<T>>>::links(node).as_mut() }
}

#[inline]
unsafe fn value<'a, T>(node: NonNull<Node<T>>) -> &'a T {
    unsafe { &(*node.as_ptr()).value }
}

/// Returns the cached height of the pointed-to node, or 0 for a missing node.
#[inline]
unsafe fn height_of<T>(node: Link<T>) -> u8 {
    node.map_or(0, |n| unsafe { links(n).height() })
}

unsafe fn balance_of<T>(node: NonNull<Node<T>>) -> i16 {
    unsafe {
        let links = links(node);
        i16::from(height_of(links.left())) - i16::from(height_of(links.right()))
    }
}

// Returns the side `node` leans toward, if any.
unsafe fn lean_of<T>(node: NonNull<Node<T>>) -> Option<Dir> {
    match unsafe { balance_of(node) }.cmp(&0) {
        Ordering::Greater => Some(Dir::Left),
        Ordering::Equal => None,
        Ordering::Less => Some(Dir::Right),
    }
}

impl<T> AvlTree<T> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree {
            root: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree: the number of nodes on its longest root-to-leaf path.
    ///
    /// An empty tree has height 0.
    pub fn height(&self) -> usize {
        usize::from(unsafe { height_of(self.root) })
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        let root = self.root?;
        unsafe { Some(value(self.extreme_in_subtree(root, Dir::Left))) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        let root = self.root?;
        unsafe { Some(value(self.extreme_in_subtree(root, Dir::Right))) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T> {
        let root = self.root?;
        unsafe {
            let first = self.extreme_in_subtree(root, Dir::Left);
            Some(self.remove_at(first).value)
        }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T> {
        let root = self.root?;
        unsafe {
            let last = self.extreme_in_subtree(root, Dir::Right);
            Some(self.remove_at(last).value)
        }
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Clears the tree, removing all elements.
    ///
    /// No rebalancing is performed while the tree is torn down.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node. It has no left child.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = links(cur).parent();
                let right = links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                drop(Node::reclaim(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Returns the last node reached by following `dir` links down from `root`.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<Node<T>>, dir: Dir) -> NonNull<Node<T>> {
        let mut cur = root;

        while let Some(next) = unsafe { links(cur).child(dir) } {
            cur = next;
        }

        cur
    }

    // Removes `node` from the tree and returns it without its links.
    //
    // # Safety
    //
    // `node` must be an element of `self`.
    unsafe fn remove_at(&mut self, node: NonNull<Node<T>>) -> Box<Node<T>> {
        unsafe {
            self.detach(node);
            self.len -= 1;
            Node::reclaim(node)
        }
    }

    // Unlinks `node` from the tree and rebalances every ancestor of the structural change.
    //
    // `node` stays allocated with cleared links, and `len` is not updated.
    unsafe fn detach(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let parent = links(node).parent();

            match (links(node).left(), links(node).right()) {
                (None, None) => {
                    self.replace_child_or_set_root(parent, node, None);
                    self.rebalance_from(parent);
                }

                (Some(child), None) | (None, Some(child)) => {
                    self.replace_child_or_set_root(parent, node, Some(child));
                    links_mut(child).set_parent(parent);
                    self.rebalance_from(parent);
                }

                (Some(_), Some(_)) => {
                    // The replacement has at most one child, so detaching it takes one of the
                    // arms above. Rebalancing may rotate `node`, so its position is only read
                    // afterwards.
                    let replacement = self.replacement_candidate(node);
                    trace!("splicing a replacement into the position of a two-child node");
                    self.detach(replacement);
                    self.transplant(node, replacement);
                }
            }

            links_mut(node).clear();
        }
    }

    // Returns the in-order predecessor of `node`, or its in-order successor if it has no left
    // subtree.
    unsafe fn replacement_candidate(&self, node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        unsafe {
            if let Some(left) = links(node).left() {
                return self.extreme_in_subtree(left, Dir::Right);
            }

            let right = links(node)
                .right()
                .expect("replacement requested for a leaf node");
            self.extreme_in_subtree(right, Dir::Left)
        }
    }

    // Puts the detached node `new` in the exact position of `old`, adopting its parent, its
    // children and its height.
    //
    // `old`'s links are left untouched.
    unsafe fn transplant(&mut self, old: NonNull<Node<T>>, new: NonNull<Node<T>>) {
        unsafe {
            let old_links = links(old);
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();
            let height = old_links.height();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_height(height);
        }
    }

    // Walks from `start` to the root, refreshing the height of every node on the path and
    // rotating wherever the balance rule is violated.
    unsafe fn rebalance_from(&mut self, start: Link<T>) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            unsafe {
                // Rotating moves `cur` below its replacement, so its parent is read first.
                let parent = links(cur).parent();

                self.update_height(cur);
                self.restore_balance(cur);

                opt_cur = parent;
            }
        }
    }

    // Rotates at `node` if `|b(node)| > 1`.
    //
    // The children of `node` must already be balanced.
    unsafe fn restore_balance(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let heavy = match balance_of(node) {
                b if b > 1 => Dir::Left,
                b if b < -1 => Dir::Right,
                _ => return,
            };

            let child = links(node)
                .child(heavy)
                .expect("the heavy side of a node must not be empty");

            // Left-Right and Right-Left cases: straighten the child first.
            if lean_of(child) == Some(!heavy) {
                self.rotate(child, heavy);
            }

            self.rotate(node, !heavy);
        }
    }

    // Performs a rotation, moving `down` toward `dir` and its `!dir` child `up` into its place.
    //
    // Does nothing if `down` has no `!dir` child. The heights of `down` and `up` are updated;
    // the heights of their ancestors are not.
    unsafe fn rotate(&mut self, down: NonNull<Node<T>>, dir: Dir) {
        unsafe {
            let Some(up) = links(down).child(!dir) else {
                return;
            };

            // `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let across = links(up).child(dir);
            links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            links_mut(up).set_child(dir, Some(down));
            let parent = links_mut(down).set_parent(Some(up));
            links_mut(up).set_parent(parent);
            self.replace_child_or_set_root(parent, down, Some(up));

            self.update_height(down);
            self.update_height(up);

            trace!(?dir, "rotated");
        }
    }

    #[inline]
    unsafe fn update_height(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let links = links_mut(node);
            let height = 1 + height_of(links.left()).max(height_of(links.right()));
            links.set_height(height);
        }
    }

    #[inline]
    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<Node<T>>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);

            debug_assert!(
                new_child.is_none() || links(parent).child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            links_mut(parent).set_child(dir, new_child);
        }
    }

    unsafe fn which_child(&self, parent: NonNull<Node<T>>, child: NonNull<Node<T>>) -> Dir {
        unsafe {
            if links(parent).left() == Some(child) {
                Dir::Left
            } else {
                debug_assert_eq!(
                    links(parent).right(),
                    Some(child),
                    "`child` must be a child of `parent`"
                );
                Dir::Right
            }
        }
    }
}

impl<T: Ord> AvlTree<T> {
    /// Inserts `value` into the tree.
    ///
    /// Returns `false` and leaves the tree untouched if an equal element is already present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, value: T) -> bool {
        match self.search(&value) {
            Search::Found(_) => {
                tracing::debug!("ignoring insert of an element that is already present");
                false
            }

            Search::Empty => {
                self.root = Some(Node::alloc(value));
                self.len += 1;
                true
            }

            Search::Vacant { parent, dir } => {
                let ptr = Node::alloc(value);

                unsafe {
                    links_mut(parent).set_child(dir, Some(ptr));
                    links_mut(ptr).set_parent(Some(parent));
                    self.rebalance_from(Some(parent));
                }

                self.len += 1;
                true
            }
        }
    }

    /// Returns `true` if the tree contains an element equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the element equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(value(ptr)) }
    }

    /// Removes the element equal to `key`.
    ///
    /// Returns `true` if an element was removed.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes and returns the element equal to `key`.
    pub fn take<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(self.remove_at(ptr).value) }
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::Vacant { .. } | Search::Empty => None,
        }
    }

    fn search<Q>(&self, key: &Q) -> Search<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Empty;
        };

        loop {
            unsafe {
                let dir = match key.cmp(value(cur).borrow()) {
                    Ordering::Less => Dir::Left,
                    Ordering::Equal => return Search::Found(cur),
                    Ordering::Greater => Dir::Right,
                };

                match links(cur).child(dir) {
                    Some(child) => cur = child,
                    None => return Search::Vacant { parent: cur, dir },
                }
            }
        }
    }
}

impl<T> Drop for AvlTree<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

// SAFETY: The tree exclusively owns its nodes, and shared references to the tree only read them.
unsafe impl<T: Send> Send for AvlTree<T> {}
unsafe impl<T: Sync> Sync for AvlTree<T> {}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> FromIterator<T> for AvlTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Ord> Extend<T> for AvlTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'tree, T> IntoIterator for &'tree AvlTree<T> {
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T> Arbitrary<'a> for AvlTree<T>
where
    T: Arbitrary<'a> + Ord,
{
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        u.arbitrary_iter::<T>()?.collect()
    }

    fn arbitrary_take_rest(u: Unstructured<'a>) -> arbitrary::Result<Self> {
        u.arbitrary_take_rest_iter::<T>()?.collect()
    }
}

impl<T> Links<T> {
    #[must_use]
    const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 1,
            }),
        }
    }

    #[inline]
    fn height(&self) -> u8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_height(&mut self, height: u8) {
        self.inner.get_mut().height = height;
    }

    // Resets the links to those of a detached leaf.
    fn clear(&mut self) {
        *self.inner.get_mut() = LinksInner {
            parent: None,
            children: [None; 2],
            height: 1,
        };
    }
}
