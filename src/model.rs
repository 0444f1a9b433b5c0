//! Model-based checking of [`ZipTree`] against [`BTreeMap`], shared by the property tests and the
//! fuzz targets.

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{Error, Rank, ZipTree};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

// Small explicit ranks make ties common.
fn rank_strategy() -> impl Strategy<Value = Option<u8>> {
    proptest::option::of(0u8..4)
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    /// Inserts a key, with an explicit rank or one drawn from the tree's generator.
    Insert(ItemValue, Option<u8>),
    Find(ItemValue),
    Depth(ItemValue),
    Remove(ItemValue),
    First,
    Last,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item, rank) => {
                FinalOp::Insert(get_value(sorted, item), rank.map(Rank::from))
            }
            Op::Find(item) => FinalOp::Find(get_value(sorted, item)),
            Op::Depth(item) => FinalOp::Depth(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, Option<Rank>),
    Find(u32),
    Depth(u32),
    Remove(u32),
    First,
    Last,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => (value_strategy(), rank_strategy()).prop_map(|(item, rank)| Op::Insert(item, rank)),
        2 => value_strategy().prop_map(Op::Find),
        1 => value_strategy().prop_map(Op::Depth),
        3 => value_strategy().prop_map(Op::Remove),
        1 => Just(Op::First),
        1 => Just(Op::Last),
        1 => Just(Op::Clear),
    ]
}

/// Runs `ops` against both a [`ZipTree`] and a [`BTreeMap`], checking that they agree and that
/// the tree's invariants hold after every operation.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut tree: ZipTree<u32, u64> = ZipTree::with_seed(0);

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(key, rank) => {
                insert_sorted(&mut sorted_values, key);

                // Values are tagged with the operation so a clobbered entry would be noticed.
                let value = op_id as u64;
                let from_btree = if btree.contains_key(&key) {
                    Err(Error::DuplicateKey)
                } else {
                    btree.insert(key, value);
                    Ok(())
                };
                let from_tree = match rank {
                    Some(rank) => tree.insert_with_rank(key, value, rank),
                    None => tree.insert(key, value),
                };

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");

                if let Some(rank) = rank.filter(|_| from_tree.is_ok()) {
                    assert_eq!(tree.rank_of(&key), Ok(rank), "FinalOp #{op_id}: {final_op:?}");
                }
            }

            FinalOp::Find(key) => {
                let from_btree = btree.get(&key).ok_or(Error::KeyNotFound);
                let from_tree = tree.find(&key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Depth(key) => {
                let depth = tree.depth(&key);

                match depth {
                    Ok(depth) => {
                        assert!(btree.contains_key(&key), "FinalOp #{op_id}: {final_op:?}");
                        assert!(depth as isize <= tree.height());
                    }
                    Err(err) => {
                        assert_eq!(err, Error::KeyNotFound);
                        assert!(!btree.contains_key(&key), "FinalOp #{op_id}: {final_op:?}");
                    }
                }
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_values, key);

                let from_btree = btree.remove(&key);
                let from_tree = tree.remove(&key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(tree.find(&key), Err(Error::KeyNotFound));
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_tree = tree.first_key_value();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_tree = tree.last_key_value();

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                sorted_values.clear();
                btree.clear();
                tree.clear();

                assert_eq!(tree.height(), -1);
            }
        }

        tree.assert_invariants();
        assert_eq!(btree.len(), tree.len());
        assert!(btree.iter().eq(tree.iter()));
    }
}

/// A set of entries, together with a subset of keys to remove afterwards.
#[derive(Clone, Debug)]
pub struct ShapeInput {
    pub entries: Vec<(u16, Rank)>,
    pub removals: Vec<u16>,
}

impl<'a> arbitrary::Arbitrary<'a> for ShapeInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_entries = u8::arbitrary(u)? % 100;

        let entries = core::iter::repeat_with(|| {
            let key = u16::arbitrary(u).unwrap_or(0);
            let rank = u8::arbitrary(u).unwrap_or(0) % 8;
            (key, Rank::from(rank))
        })
        .take(num_entries.into())
        .collect::<Vec<_>>();

        let removals = entries
            .iter()
            .filter(|_| bool::arbitrary(u).unwrap_or(false))
            .map(|&(key, _)| key)
            .collect();

        Ok(ShapeInput { entries, removals })
    }
}

pub fn shape_input_strategy() -> impl Strategy<Value = ShapeInput> {
    proptest::collection::vec((0u16..500, 0u32..6), 0..100).prop_flat_map(|entries| {
        let len = entries.len();
        (
            Just(entries),
            proptest::collection::vec(proptest::bool::ANY, len),
        )
            .prop_map(|(entries, remove)| {
                let removals = entries
                    .iter()
                    .zip(remove)
                    .filter_map(|(&(key, _), remove)| remove.then_some(key))
                    .collect();

                ShapeInput { entries, removals }
            })
    })
}

/// Checks that the shape of a tree depends only on the (key, rank) pairs it holds: insertion in
/// several orders, and removal of some keys, must all agree with a tree built directly.
pub fn run_shape_determinism(input: ShapeInput) {
    let ShapeInput { entries, removals } = input;

    fn build(entries: impl IntoIterator<Item = (u16, Rank)>) -> ZipTree<u16, ()> {
        let mut tree = ZipTree::with_seed(0);
        for (key, rank) in entries {
            tree.insert_with_rank(key, (), rank)
                .expect("entries have unique keys");
        }
        tree.assert_invariants();
        tree
    }

    // Keep the first rank given for each key.
    let mut seen = BTreeSet::new();
    let entries: Vec<(u16, Rank)> = entries
        .into_iter()
        .filter(|&(key, _)| seen.insert(key))
        .collect();
    let mut unique: BTreeMap<u16, Rank> = entries.iter().copied().collect();

    let forward = build(entries.iter().copied());
    let mut backward = build(entries.iter().rev().copied());
    let sorted = build(unique.iter().map(|(&key, &rank)| (key, rank)));

    assert_eq!(forward.shape(), backward.shape());
    assert_eq!(forward.shape(), sorted.shape());
    assert_eq!(forward.len(), unique.len());

    for key in &removals {
        let expected = unique.remove(key).map(|_| ());
        assert_eq!(backward.remove(key), expected);
        backward.assert_invariants();
    }

    let remaining = build(unique.iter().map(|(&key, &rank)| (key, rank)));
    assert_eq!(backward.shape(), remaining.shape());
}
