use std::fmt;

use cordyceps_avl::{AvlTree, BinarySearchTree};
use tracing_subscriber::EnvFilter;

fn print_tree<T, B>(tree: &B)
where
    T: Ord + fmt::Display,
    B: BinarySearchTree<T>,
{
    tree.in_order_traversal(&mut |item: &T| println!("{item}"));
}

fn main() -> fmt::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut tree: AvlTree<u32> = AvlTree::new();
    assert_eq!(tree.height(), 0);

    for i in 0..10 {
        tree.add(i);
        tree.assert_invariants();
    }

    assert!(tree.height() <= 4);
    assert_eq!(tree.len(), 10);
    tracing::info!(len = tree.len(), height = tree.height(), "inserted ascending values");

    print_tree(&tree);

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot)?;
    println!("{dot}");

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
    tracing::info!("removed every value");

    Ok(())
}
