use std::{collections::VecDeque, fmt};

use crate::{Node, Rank, ZipTree};

/// The position of one node in a [`ZipTree`], as reported by [`ZipTree::shape`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeShape<'a, K> {
    pub key: &'a K,
    pub rank: Rank,
    pub left: Option<&'a K>,
    pub right: Option<&'a K>,
}

impl<K, V, R> ZipTree<K, V, R> {
    /// Lists every node with its rank and the keys of its children, in preorder.
    ///
    /// Two trees have the same shape exactly when their shapes compare equal.
    pub fn shape(&self) -> Vec<NodeShape<'_, K>> {
        let mut shape = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();

        while let Some(node) = stack.pop() {
            shape.push(NodeShape {
                key: &node.key,
                rank: node.rank,
                left: node.left().map(|left| &left.key),
                right: node.right().map(|right| &right.key),
            });

            stack.extend(node.right());
            stack.extend(node.left());
        }

        shape
    }

    /// Writes the tree to `w` as a Graphviz digraph named `name`.
    ///
    /// Nodes are labelled `key:rank` and laid out one level per row.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        let root = match self.root.as_deref() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<'a, K, V> {
            Node(&'a Node<K, V>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for item in queue.drain(..).collect::<Vec<_>>() {
                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = &node.key;
                let rank = node.rank;
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{rank}\"]; ")?;

                for child in [node.left(), node.right()] {
                    match child {
                        Some(child) => {
                            let child_key = &child.key;

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }

                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
