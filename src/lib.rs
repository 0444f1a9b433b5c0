//! A zip tree: a randomized binary search tree balanced by node ranks instead of rotations.
//!
//! Implementation based on the paper [Zip Trees] by Tarjan, Levy and Timmel.
//!
//! [Zip Trees]: https://arxiv.org/abs/1806.06726

// Conventions used in comments:
// - The rank of a node `x` is denoted `r(x)`.
// - The key of a node `x` is denoted `k(x)`.
//
// The invariants of a zip tree are:
// 1. Keys are in symmetric order: every key in the left subtree of `x` is less than `k(x)`, and
//    every key in the right subtree is greater.
// 2. Ranks are max-heap ordered: `r(x.left) < r(x)` and `r(x.right) <= r(x)`.
//
// Corollary:
// 3. Among nodes of equal rank, the one with the smallest key is the ancestor of the others, so
//    the root of every subtree is the node of maximum rank with the smallest key. Hence the shape
//    of the tree depends only on its set of (key, rank) pairs, not on the order of insertion.
//
// Insertion walks down to the first node the new node outranks and splits ("unzips") the subtree
// rooted there around the new key. Removal merges ("zips") the two children of the removed node
// back together by rank. Both walk a single path, so their cost is bounded by the height, which is
// _O(log(n))_ in expectation for geometrically distributed ranks.

use core::{borrow::Borrow, cmp::Ordering, fmt};

mod debug;
mod error;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod rank;

pub use debug::NodeShape;
pub use error::{Error, Result};
pub use iter::Iter;
pub use rank::{GeometricRank, Rank, RankGenerator};

/// An ordered map based on a [zip tree].
///
/// Keys must be unique. Each entry carries a rank, drawn from the tree's [`RankGenerator`] on
/// [`insert`](ZipTree::insert) or given explicitly to
/// [`insert_with_rank`](ZipTree::insert_with_rank).
///
/// [zip tree]: https://en.wikipedia.org/wiki/Zip_tree
pub struct ZipTree<K, V, R = GeometricRank> {
    root: Link<K, V>,
    len: usize,
    ranks: R,
}

pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    rank: Rank,
    children: [Link<K, V>; 2],
}

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// Returns the side of a node with key `than` on which `key` belongs.
    #[inline]
    fn of<Q: Ord + ?Sized>(key: &Q, than: &Q) -> Dir {
        if key < than {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<K, V> Node<K, V> {
    #[inline]
    fn child(&self, dir: Dir) -> Option<&Node<K, V>> {
        self.children[dir as usize].as_deref()
    }

    #[inline]
    fn left(&self) -> Option<&Node<K, V>> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Option<&Node<K, V>> {
        self.child(Dir::Right)
    }

    #[inline]
    fn children(&self) -> impl Iterator<Item = &Node<K, V>> {
        self.children.iter().filter_map(|child| child.as_deref())
    }

    #[inline]
    fn slot_mut(&mut self, dir: Dir) -> &mut Link<K, V> {
        &mut self.children[dir as usize]
    }
}

impl<K: Ord, V> ZipTree<K, V> {
    /// Returns a new empty tree with ranks seeded from the thread-local RNG.
    pub fn new() -> Self {
        ZipTree::with_rank_generator(GeometricRank::from_entropy())
    }

    /// Returns a new empty tree whose rank sequence is determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        ZipTree::with_rank_generator(GeometricRank::from_seed(seed))
    }
}

impl<K: Ord, V> Default for ZipTree<K, V> {
    fn default() -> Self {
        ZipTree::new()
    }
}

impl<K, V, R> ZipTree<K, V, R> {
    /// Returns a new empty tree drawing ranks from `ranks`.
    pub const fn with_rank_generator(ranks: R) -> Self {
        ZipTree {
            root: None,
            len: 0,
            ranks,
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

    /// Returns the number of elements in the tree.
    ///
    /// This is the same as [`len`](ZipTree::len).
    #[inline]
    pub const fn size(&self) -> usize {
        self.len
    }

    /// Returns the number of edges on the longest path from the root to a leaf.
    ///
    /// A tree with a single element has height 0; an empty tree has height -1.
    pub fn height(&self) -> isize {
        let mut level: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();
        let mut height = -1;

        // Level-order traversal, one level per iteration.
        while !level.is_empty() {
            height += 1;
            level = level.into_iter().flat_map(|node| node.children()).collect();
        }

        height
    }

    /// Returns the entry with the minimum key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut cur = self.root.as_deref()?;

        while let Some(left) = cur.left() {
            cur = left;
        }

        Some((&cur.key, &cur.value))
    }

    /// Returns the entry with the maximum key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut cur = self.root.as_deref()?;

        while let Some(right) = cur.right() {
            cur = right;
        }

        Some((&cur.key, &cur.value))
    }

    /// Returns an iterator over the entries of the tree, in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref(), self.len)
    }

    /// Clears the tree, removing all elements.
    ///
    /// This runs in _O(n)_ time and constant extra space regardless of the shape of the tree.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root.take();

        while let Some(mut cur) = opt_cur {
            match cur.slot_mut(Dir::Left).take() {
                // Rotate the left child up, so every node is eventually reached without a left
                // subtree.
                Some(mut left) => {
                    *cur.slot_mut(Dir::Left) = left.slot_mut(Dir::Right).take();
                    *left.slot_mut(Dir::Right) = Some(cur);
                    opt_cur = Some(left);
                }

                // Drop the node and continue with its right subtree.
                None => opt_cur = cur.slot_mut(Dir::Right).take(),
            }
        }

        if self.len > 0 {
            tracing::trace!(len = self.len, "cleared tree");
        }

        self.len = 0;
    }
}

impl<K: Ord, V, R> ZipTree<K, V, R> {
    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key).map(|(node, _)| &node.value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root.as_deref_mut();

        while let Some(cur) = opt_cur {
            match key.cmp(cur.key.borrow()) {
                Ordering::Less => opt_cur = cur.slot_mut(Dir::Left).as_deref_mut(),
                Ordering::Equal => return Some(&mut cur.value),
                Ordering::Greater => opt_cur = cur.slot_mut(Dir::Right).as_deref_mut(),
            }
        }

        None
    }

    /// Returns `true` if the tree contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// Fails with [`Error::KeyNotFound`] if the tree does not contain `key`.
    #[inline]
    pub fn find<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the number of edges between the root and the node holding `key`.
    ///
    /// Fails with [`Error::KeyNotFound`] if the tree does not contain `key`.
    pub fn depth<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key)
            .map(|(_, depth)| depth)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns the rank stored with `key`.
    ///
    /// Fails with [`Error::KeyNotFound`] if the tree does not contain `key`.
    pub fn rank_of<Q>(&self, key: &Q) -> Result<Rank>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key)
            .map(|(node, _)| node.rank)
            .ok_or(Error::KeyNotFound)
    }

    // Returns the node holding `key` and its depth.
    fn get_node<Q>(&self, key: &Q) -> Option<(&Node<K, V>, usize)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root.as_deref();
        let mut depth = 0;

        loop {
            let cur = opt_cur?;

            match key.cmp(cur.key.borrow()) {
                Ordering::Less => opt_cur = cur.left(),
                Ordering::Equal => return Some((cur, depth)),
                Ordering::Greater => opt_cur = cur.right(),
            }

            depth += 1;
        }
    }

    /// Inserts `key` with the given `rank`, bypassing the rank generator.
    ///
    /// Fails with [`Error::DuplicateKey`] if the tree already contains `key`, in which case the
    /// tree is left unchanged.
    ///
    /// This operation completes in _O(log(n))_ expected time when ranks are geometrically
    /// distributed.
    pub fn insert_with_rank(&mut self, key: K, value: V, rank: Rank) -> Result<()> {
        if self.contains_key(&key) {
            tracing::debug!(rank, "rejected duplicate key");
            return Err(Error::DuplicateKey);
        }

        self.len += 1;

        // Descend to the insertion point: the first node `y` with `r(y) < rank`, or with
        // `r(y) == rank` and `k(y) > key`. Nodes of equal rank and smaller key stay above.
        let slot = descend(&mut self.root, |node| {
            let stays_above = node.rank > rank || (node.rank == rank && node.key < key);
            stays_above.then(|| Dir::of(&key, &node.key))
        });

        // If there is no insertion point the slot is empty and the new node becomes a leaf.
        let displaced = slot.take();
        let split = displaced.is_some();
        let (left, right) = unzip(displaced, &key);

        *slot = Some(Box::new(Node {
            key,
            value,
            rank,
            children: [left, right],
        }));

        tracing::trace!(rank, split, len = self.len, "inserted key");

        Ok(())
    }

    /// Removes the value associated with `key` from the tree.
    ///
    /// Returns `None`, leaving the tree unchanged, if the tree does not contain `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let slot = descend(&mut self.root, |node| match key.cmp(node.key.borrow()) {
            Ordering::Less => Some(Dir::Left),
            Ordering::Equal => None,
            Ordering::Greater => Some(Dir::Right),
        });

        let Node {
            value,
            rank,
            children: [left, right],
            ..
        } = *slot.take()?;

        *slot = zip(left, right);
        self.len -= 1;

        tracing::trace!(rank, len = self.len, "removed key");

        Some(value)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut reachable = 0;

        // Each entry carries the exclusive key bounds inherited from its ancestors.
        let mut stack: Vec<(&Node<K, V>, Option<&K>, Option<&K>)> = self
            .root
            .as_deref()
            .map(|root| (root, None, None))
            .into_iter()
            .collect();

        while let Some((node, lower, upper)) = stack.pop() {
            reachable += 1;

            // Ensure keys are in symmetric order.
            if let Some(lower) = lower {
                assert!(*lower < node.key, "key is not above its lower bound");
            }
            if let Some(upper) = upper {
                assert!(node.key < *upper, "key is not below its upper bound");
            }

            // Ensure ranks are heap ordered, with ties only to the right.
            if let Some(left) = node.left() {
                assert!(
                    left.rank < node.rank,
                    "left child has rank {} under parent of rank {}",
                    left.rank,
                    node.rank
                );
                stack.push((left, lower, Some(&node.key)));
            }
            if let Some(right) = node.right() {
                assert!(
                    right.rank <= node.rank,
                    "right child has rank {} under parent of rank {}",
                    right.rank,
                    node.rank
                );
                stack.push((right, Some(&node.key), upper));
            }
        }

        assert_eq!(reachable, self.len, "length does not match reachable nodes");
    }
}

impl<K: Ord, V, R: RankGenerator> ZipTree<K, V, R> {
    /// Inserts `key` with a rank drawn from the tree's rank generator.
    ///
    /// Fails with [`Error::DuplicateKey`] if the tree already contains `key`, in which case the
    /// tree is left unchanged.
    ///
    /// This operation completes in _O(log(n))_ expected time.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let rank = self.ranks.next_rank();
        self.insert_with_rank(key, value, rank)
    }
}

impl<K, V, R> Drop for ZipTree<K, V, R> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, R> fmt::Debug for ZipTree<K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'tree, K, V, R> IntoIterator for &'tree ZipTree<K, V, R> {
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Descends from `slot` for as long as `step` picks a direction, and returns the slot it stopped
// at, which may be empty.
fn descend<'a, K, V>(
    mut slot: &'a mut Link<K, V>,
    mut step: impl FnMut(&Node<K, V>) -> Option<Dir>,
) -> &'a mut Link<K, V> {
    while let Some(dir) = slot.as_deref().and_then(&mut step) {
        match slot {
            Some(node) => slot = node.slot_mut(dir),
            None => break,
        }
    }

    slot
}

// Splits the subtree rooted at `cur` into the nodes with keys less than `key` and the nodes with
// keys greater than `key`.
//
// The nodes on the search path for `key` are distributed between the two results in path order,
// each one hanging off the previous node of its side. Every other node keeps its position relative
// to its path ancestor, so both results remain zip trees.
fn unzip<K: Ord, V>(mut cur: Link<K, V>, key: &K) -> (Link<K, V>, Link<K, V>) {
    let mut low = None;
    let mut high = None;

    // The empty slots where the next path node of each side is attached.
    let mut low_tail = &mut low;
    let mut high_tail = &mut high;

    while let Some(mut node) = cur {
        debug_assert!(node.key != *key, "unzipped around a key already present");

        if node.key < *key {
            cur = node.slot_mut(Dir::Right).take();
            low_tail = low_tail.insert(node).slot_mut(Dir::Right);
        } else {
            cur = node.slot_mut(Dir::Left).take();
            high_tail = high_tail.insert(node).slot_mut(Dir::Left);
        }
    }

    (low, high)
}

// Merges `left` and `right` into a single subtree, where every key in `left` is less than every
// key in `right`.
//
// Walks down the right spine of `left` and the left spine of `right`, attaching the higher-ranked
// of the two current nodes at each step. Ties go to `left`, which keeps equal ranks to the right.
fn zip<K, V>(mut left: Link<K, V>, mut right: Link<K, V>) -> Link<K, V> {
    let mut root = None;
    let mut tail = &mut root;

    loop {
        match (left, right) {
            (Some(mut p), Some(mut q)) => {
                if p.rank < q.rank {
                    right = q.slot_mut(Dir::Left).take();
                    left = Some(p);
                    tail = tail.insert(q).slot_mut(Dir::Left);
                } else {
                    left = p.slot_mut(Dir::Right).take();
                    right = Some(q);
                    tail = tail.insert(p).slot_mut(Dir::Right);
                }
            }

            (rest, None) | (None, rest) => {
                *tail = rest;
                return root;
            }
        }
    }
}
