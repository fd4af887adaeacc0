use std::ops::Range;

use proptest::prelude::*;

use crate::model::{self, height_bound};

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(key));
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.get(key), Some(key), "item not found");
    }
}

fn in_order(tree: &AvlTree<u32>) -> Vec<u32> {
    let mut out = Vec::with_capacity(tree.len());
    tree.in_order(|&v| out.push(v));
    out
}

fn pre_order(tree: &AvlTree<u32>) -> Vec<u32> {
    let mut out = Vec::with_capacity(tree.len());
    tree.pre_order(|&v| out.push(v));
    out
}

fn post_order(tree: &AvlTree<u32>) -> Vec<u32> {
    let mut out = Vec::with_capacity(tree.len());
    tree.post_order(|&v| out.push(v));
    out
}

// Calls `f` with every permutation of `keys`.
fn for_each_permutation(keys: &mut [u32], k: usize, f: &mut impl FnMut(&[u32])) {
    if k == keys.len() {
        f(keys);
        return;
    }

    for i in k..keys.len() {
        keys.swap(k, i);
        for_each_permutation(keys, k + 1, f);
        keys.swap(k, i);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn five_elems_find() {
    for_each_permutation(&mut [0, 1, 2, 3, 4], 0, &mut |keys: &[u32]| insert_find_all(keys));
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert!(tree.remove(key), "item not found");
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert!(tree.remove(key), "item not found");
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_six() {
    for_each_permutation(&mut [0, 1, 2, 3, 4, 5], 0, &mut |keys: &[u32]| {
        insert_remove_all(keys)
    });
}

#[test]
fn ascending_inserts_then_removes() {
    let mut tree = AvlTree::new();
    assert_eq!(tree.height(), 0);

    for i in 0..10 {
        tree.insert(i);
    }

    assert_eq!(tree.height(), 4);
    assert_eq!(tree.len(), 10);

    for i in 0..10 {
        assert!(tree.contains(&i));
    }

    assert!(!tree.contains(&11));

    for i in 0..10 {
        assert!(tree.remove(&i));
        tree.assert_invariants();
    }

    assert_eq!(tree.height(), 0);
    assert_eq!(tree.len(), 0);
    assert!(!tree.contains(&0));
}

#[test]
fn ascending_inserts_shape() {
    let tree: AvlTree<u32> = (0..10).collect();

    // 3(1(0, 2), 7(5(4, 6), 8(-, 9)))
    assert_eq!(pre_order(&tree), [3, 1, 0, 2, 7, 5, 4, 6, 8, 9]);
    assert_eq!(in_order(&tree), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(post_order(&tree), [0, 2, 1, 4, 6, 5, 9, 8, 7, 3]);
}

#[test]
fn descending_inserts_stay_balanced() {
    let mut tree = AvlTree::new();

    for i in (0..1000u32).rev() {
        tree.insert(i);
    }

    tree.assert_invariants();
    assert!(tree.height() <= height_bound(1000));
    assert_eq!(in_order(&tree), (0..1000).collect::<Vec<_>>());
}

#[test]
fn duplicate_insert_is_ignored() {
    let mut tree = AvlTree::new();

    assert!(tree.insert(5));
    assert!(!tree.insert(5));
    assert_eq!(tree.len(), 1);
    assert!(tree.contains(&5));

    BinarySearchTree::add(&mut tree, 5);
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

#[test]
fn remove_absent_is_noop() {
    let mut tree: AvlTree<u32> = (0..10).collect();
    let before = pre_order(&tree);

    assert!(!tree.remove(&11));
    assert_eq!(tree.take(&42), None);
    assert_eq!(tree.len(), 10);
    assert_eq!(pre_order(&tree), before);

    let mut empty: AvlTree<u32> = AvlTree::new();
    assert!(!empty.remove(&0));
}

#[test]
fn remove_two_child_root_uses_predecessor() {
    let mut tree: AvlTree<u32> = (0..10).collect();

    assert!(tree.remove(&3));
    tree.assert_invariants();

    // The predecessor 2 takes the root's place.
    assert_eq!(pre_order(&tree), [2, 1, 0, 7, 5, 4, 6, 8, 9]);
}

#[test]
fn remove_two_child_inner_node() {
    let mut tree: AvlTree<u32> = (0..10).collect();

    assert!(tree.remove(&7));
    tree.assert_invariants();

    // 6 is the rightmost node of 7's left subtree.
    assert_eq!(pre_order(&tree), [3, 1, 0, 2, 6, 5, 4, 8, 9]);
}

#[test]
fn remove_rebalances_ancestors() {
    let mut tree: AvlTree<u32> = (0..10).collect();

    // Removing the left side leaves the root right-heavy by two.
    assert!(tree.remove(&0));
    assert!(tree.remove(&2));
    tree.assert_invariants();
    assert!(tree.remove(&1));
    tree.assert_invariants();

    // The root's right child is hoisted, then 3 is rotated below 5.
    assert_eq!(pre_order(&tree), [7, 5, 3, 4, 6, 8, 9]);
    assert_eq!(tree.height(), 4);
}

#[test]
fn take_returns_the_stored_element() {
    let mut tree: AvlTree<String> = ["b", "a", "c"].iter().map(|s| s.to_string()).collect();

    assert_eq!(tree.take("a").as_deref(), Some("a"));
    assert!(!tree.contains("a"));
    assert_eq!(tree.get("c").map(String::as_str), Some("c"));
    tree.assert_invariants();
}

#[test]
fn first_last_pop() {
    let mut tree: AvlTree<u32> = [5, 3, 8, 1, 9].into_iter().collect();

    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&9));

    assert_eq!(tree.pop_first(), Some(1));
    tree.assert_invariants();
    assert_eq!(tree.pop_last(), Some(9));
    tree.assert_invariants();

    assert_eq!(in_order(&tree), [3, 5, 8]);

    tree.clear();
    assert_eq!(tree.first(), None);
    assert_eq!(tree.pop_last(), None);
}

#[test]
fn iterators_ascend() {
    let tree: AvlTree<u32> = [4, 2, 6, 1, 3, 5, 7].into_iter().collect();

    let borrowed: Vec<u32> = tree.iter().copied().collect();
    assert_eq!(borrowed, [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(tree.iter().len(), 7);

    let mut for_loop = Vec::new();
    for &v in &tree {
        for_loop.push(v);
    }
    assert_eq!(for_loop, borrowed);

    let owned: Vec<u32> = tree.into_iter().rev().collect();
    assert_eq!(owned, [7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn trait_traversals_match_inherent() {
    fn collect(tree: &dyn BinarySearchTree<u32>, order: Order) -> Vec<u32> {
        let mut out = Vec::new();
        let mut visit = |v: &u32| out.push(*v);
        match order {
            Order::PreOrder => tree.pre_order_traversal(&mut visit),
            Order::InOrder => tree.in_order_traversal(&mut visit),
            Order::PostOrder => tree.post_order_traversal(&mut visit),
        }
        out
    }

    let mut tree: AvlTree<u32> = AvlTree::new();
    for i in [8, 3, 10, 1, 6, 14, 4, 7, 13] {
        BinarySearchTree::add(&mut tree, i);
    }

    assert_eq!(collect(&tree, Order::PreOrder), pre_order(&tree));
    assert_eq!(collect(&tree, Order::InOrder), in_order(&tree));
    assert_eq!(collect(&tree, Order::PostOrder), post_order(&tree));

    assert!(BinarySearchTree::remove(&mut tree, &6));
    assert!(!BinarySearchTree::contains(&tree, &6));
}

#[test]
fn debug_formats_as_set() {
    let tree: AvlTree<u32> = [2, 1, 3].into_iter().collect();
    assert_eq!(format!("{tree:?}"), "{1, 2, 3}");
}

#[test]
fn dotgraph_labels_balance() {
    let mut out = String::new();
    AvlTree::<u32>::new().dotgraph("empty", &mut out).unwrap();
    assert_eq!(out, "digraph \"empty\" {}");

    // 2(1, 3(-, 4))
    let tree: AvlTree<u32> = [2, 1, 3, 4].into_iter().collect();
    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();

    assert!(out.starts_with("digraph \"t\" {\n"));
    assert!(out.contains("  {rank=same; \"t-n0\" [label=\"2:-1\"]; }\n"));
    assert!(out.contains("  {rank=same; \"t-n1\" [label=\"1:0\"]; \"t-n2\" [label=\"3:-1\"]; }\n"));
    assert!(out.contains("  \"t-n0\" -> \"t-n1\";\n"));
    assert!(out.contains("  \"t-n1\" -> \"t-m0\";\n"));
    assert!(out.contains("  \"t-n2\" -> \"t-m2\";\n"));
    assert!(out.contains("  \"t-n2\" -> \"t-n3\";\n"));
    assert!(out.ends_with('}'));
}

#[test]
fn dotgraph_tolerates_equal_labels() {
    use core::cmp::Ordering;

    // Orders by `rank` but displays only `label`, so every node prints the same text.
    #[derive(PartialEq, Eq)]
    struct Labelled {
        rank: u32,
        label: &'static str,
    }

    impl PartialOrd for Labelled {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Labelled {
        fn cmp(&self, other: &Self) -> Ordering {
            self.rank.cmp(&other.rank)
        }
    }

    impl core::fmt::Display for Labelled {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.label)
        }
    }

    let tree: AvlTree<Labelled> = (0..3).map(|rank| Labelled { rank, label: "x" }).collect();
    let mut out = String::new();
    tree.dotgraph("same", &mut out).unwrap();

    assert_eq!(out.matches("[label=\"x:0\"]").count(), 3);
    assert!(out.contains("\"same-n0\" -> \"same-n1\";"));
    assert!(out.contains("\"same-n0\" -> \"same-n2\";"));
}

#[test]
fn check_invariants_accepts_valid_trees() {
    let tree: AvlTree<u32> = (0..100).collect();
    assert_eq!(tree.check_invariants(), Ok(()));
    assert_eq!(AvlTree::<u32>::new().check_invariants(), Ok(()));
}

#[test]
fn check_invariants_reports_stale_height() {
    let mut tree: AvlTree<u32> = (0..3).collect();

    let root = tree.root.unwrap();
    unsafe { links_mut(root).set_height(7) };

    assert_eq!(
        tree.check_invariants(),
        Err(InvariantViolation::StaleHeight {
            depth: 0,
            cached: 7,
            actual: 2,
        })
    );

    unsafe { links_mut(root).set_height(2) };
    tree.assert_invariants();
    tree.clear();
}

#[test]
fn arbitrary_builds_valid_trees() {
    use std::collections::BTreeSet;

    use arbitrary::{Arbitrary, Unstructured};

    // Each element is a nonzero byte followed by a `u16`, so length-prefixed and
    // continuation-flagged collection encodings both decode several elements.
    let bytes: Vec<u8> = (0..64u8)
        .flat_map(|i| [1, i.wrapping_mul(37), i % 5])
        .collect();

    let tree =
        <AvlTree<u16> as Arbitrary>::arbitrary_take_rest(Unstructured::new(&bytes)).unwrap();
    let model =
        <BTreeSet<u16> as Arbitrary>::arbitrary_take_rest(Unstructured::new(&bytes)).unwrap();

    tree.assert_invariants();
    assert!(!tree.is_empty());
    assert_eq!(tree.len(), model.len());
    assert!(tree.iter().eq(model.iter()));

    let mut u = Unstructured::new(&bytes);
    let tree = <AvlTree<u16> as Arbitrary>::arbitrary(&mut u).unwrap();
    let mut u = Unstructured::new(&bytes);
    let model = <BTreeSet<u16> as Arbitrary>::arbitrary(&mut u).unwrap();

    tree.assert_invariants();
    assert!(tree.iter().eq(model.iter()));
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn in_order_is_sorted(values in proptest::collection::vec(any::<i32>(), FUZZ_RANGE)) {
        let tree: AvlTree<i32> = values.iter().copied().collect();

        let mut expected = values.clone();
        expected.sort_unstable();
        expected.dedup();

        let mut visited = Vec::new();
        tree.in_order(|&v| visited.push(v));

        prop_assert_eq!(visited, expected);
        prop_assert!(tree.height() <= height_bound(tree.len()));
    }

    #[test]
    fn ten_distinct_inserts_height_at_most_four(
        keys in proptest::sample::subsequence((0..1000u32).collect::<Vec<_>>(), 10).prop_shuffle(),
    ) {
        let mut tree = AvlTree::new();
        for &key in &keys {
            prop_assert!(tree.insert(key));
        }

        tree.assert_invariants();
        prop_assert_eq!(tree.len(), 10);
        prop_assert!(tree.height() <= 4, "height {} for {:?}", tree.height(), keys);
    }

    #[test]
    fn ten_inserts_after_removals_height_at_most_four(
        keys in Just((0..20u32).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        // Twenty inserts followed by ten removals leaves ten elements shaped by deletion.
        let mut tree: AvlTree<u32> = keys.iter().copied().collect();
        for key in &keys[..10] {
            prop_assert!(tree.remove(key));
        }

        tree.assert_invariants();
        prop_assert_eq!(tree.len(), 10);
        prop_assert!(tree.height() <= 4, "height {} for {:?}", tree.height(), keys);
    }
}
