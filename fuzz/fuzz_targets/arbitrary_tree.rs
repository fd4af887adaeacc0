#![no_main]

use cordyceps_avl::AvlTree;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (AvlTree<u16>, Vec<u16>)| {
    let (mut tree, removals) = input;
    tree.assert_invariants();

    for value in removals {
        let was_present = tree.contains(&value);
        assert_eq!(tree.remove(&value), was_present);
        assert!(!tree.contains(&value));
        tree.assert_invariants();
    }
});
