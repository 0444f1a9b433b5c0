use core::iter::FusedIterator;

use crate::Node;

/// An in-order iterator over the entries of a [`ZipTree`](crate::ZipTree).
///
/// Created by [`ZipTree::iter`](crate::ZipTree::iter).
pub struct Iter<'tree, K, V> {
    // Nodes whose left subtree has been entered but which have not been yielded yet. The top of
    // the stack is the next node in key order.
    pending: Vec<&'tree Node<K, V>>,

    len: usize,
}

impl<'tree, K, V> Iter<'tree, K, V> {
    pub(crate) fn new(root: Option<&'tree Node<K, V>>, len: usize) -> Self {
        let mut iter = Iter {
            pending: Vec::new(),
            len,
        };

        iter.descend_left(root);
        iter
    }

    // Upon entering a new subtree, stack its left spine down to the minimum element.
    fn descend_left(&mut self, mut opt_cur: Option<&'tree Node<K, V>>) {
        while let Some(cur) = opt_cur {
            self.pending.push(cur);
            opt_cur = cur.left();
        }
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.pending.pop()?;

        // The left subtree of `cur` is exhausted; its successor is the minimum of the right one,
        // or else the next pending ancestor.
        self.descend_left(cur.right());
        self.len -= 1;

        Some((&cur.key, &cur.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            pending: self.pending.clone(),
            len: self.len,
        }
    }
}
