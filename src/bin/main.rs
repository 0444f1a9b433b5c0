use tracing_subscriber::EnvFilter;
use zip_tree::{Error, ZipTree};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree: ZipTree<u32, &str> = ZipTree::new();

    for (key, value, rank) in [(5, "five", 2), (3, "three", 1), (8, "eight", 1), (1, "one", 0)] {
        tree.insert_with_rank(key, value, rank)?;
        tree.assert_invariants();
        println!("{tree:?}");
    }

    println!(
        "size {}, height {}, depth of 1: {}",
        tree.size(),
        tree.height(),
        tree.depth(&1)?
    );

    for key in [13, 21, 34, 55] {
        tree.insert(key, "random rank")?;
        tree.assert_invariants();
    }

    let mut dot = String::new();
    match tree.dotgraph("demo", &mut dot) {
        Ok(()) => println!("{dot}"),
        Err(err) => eprintln!("failed to render dot graph: {err}"),
    }

    assert_eq!(tree.insert(5, "again"), Err(Error::DuplicateKey));

    assert!(tree.remove(&5).is_some());
    tree.assert_invariants();
    assert_eq!(tree.find(&5), Err(Error::KeyNotFound));
    println!("{tree:?}");

    Ok(())
}
