//! B-tree keyed map with arena-allocated nodes.
//!
//! Textbook B-tree (Cormen/Leiserson/Rivest) parameterized by a degree
//! `t >= 2`. Every non-root node holds between `t - 1` and `2t - 1`
//! entries, every leaf sits at the same depth, and keys increase
//! strictly left to right across the whole tree.
//!
//! Nodes live in a `Vec` arena and refer to each other by index, so
//! split, merge and borrow operations move indices instead of juggling
//! ownership of recursive structures. Merged-away nodes go onto a free
//! list and are reused by later splits.

use crate::error::{Result, StoreError};
use std::cmp::Ordering;
use std::mem;

/// Index of a node in the arena.
type NodeId = usize;

#[derive(Debug)]
struct Node<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    /// Child node ids; empty for a leaf. An internal node with `k` keys
    /// has exactly `k + 1` children.
    children: Vec<NodeId>,
}

impl<K, V> Node<K, V> {
    fn leaf() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Ordered map from `K` to `V` backed by an arena B-tree.
///
/// Duplicate keys are not kept: inserting an existing key overwrites its
/// value and returns the previous one, keeping lookups and range scans
/// unambiguous.
#[derive(Debug)]
pub struct BTree<K, V> {
    nodes: Vec<Node<K, V>>,
    free: Vec<NodeId>,
    root: NodeId,
    degree: usize,
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    /// Creates an empty tree with the given branching degree.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDegree`] for `degree < 2`; the
    /// structural invariants are undefined below that.
    pub fn new(degree: usize) -> Result<Self> {
        if degree < 2 {
            return Err(StoreError::InvalidDegree(degree));
        }
        Ok(Self {
            nodes: vec![Node::leaf()],
            free: Vec::new(),
            root: 0,
            degree,
            len: 0,
        })
    }

    /// Number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The branching degree the tree was created with.
    pub fn degree(&self) -> usize {
        self.degree
    }

    fn max_keys(&self) -> usize {
        2 * self.degree - 1
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = node;
            id
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id] = Node::leaf();
        self.free.push(id);
    }

    /// Looks up the value stored under `key`.
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id];
            match node.keys.binary_search(key) {
                Ok(i) => return Some(&node.values[i]),
                Err(i) => {
                    if node.is_leaf() {
                        return None;
                    }
                    id = node.children[i];
                }
            }
        }
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Inserts `key` with `value`.
    ///
    /// An existing key is overwritten; the previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.nodes[self.root].keys.len() == self.max_keys() {
            // Split the root first; the tree grows by one level.
            let old_root = self.root;
            let new_root = self.alloc(Node {
                keys: Vec::new(),
                values: Vec::new(),
                children: vec![old_root],
            });
            self.root = new_root;
            self.split_child(new_root, 0);
        }
        self.insert_nonfull(key, value)
    }

    /// Top-down insert into a tree whose root is not full. Children are
    /// split pre-emptively on the way down so no path ever backtracks.
    fn insert_nonfull(&mut self, key: K, value: V) -> Option<V> {
        let mut id = self.root;
        loop {
            match self.nodes[id].keys.binary_search(&key) {
                Ok(i) => {
                    return Some(mem::replace(&mut self.nodes[id].values[i], value));
                }
                Err(i) => {
                    if self.nodes[id].is_leaf() {
                        self.nodes[id].keys.insert(i, key);
                        self.nodes[id].values.insert(i, value);
                        self.len += 1;
                        return None;
                    }
                    let child = self.nodes[id].children[i];
                    if self.nodes[child].keys.len() == self.max_keys() {
                        self.split_child(id, i);
                        // The promoted median shifts the descent target.
                        match key.cmp(&self.nodes[id].keys[i]) {
                            Ordering::Equal => {
                                return Some(mem::replace(&mut self.nodes[id].values[i], value));
                            }
                            Ordering::Greater => id = self.nodes[id].children[i + 1],
                            Ordering::Less => id = self.nodes[id].children[i],
                        }
                    } else {
                        id = child;
                    }
                }
            }
        }
    }

    /// Splits the full child at `child_idx` of `parent`, promoting the
    /// median entry into the parent.
    fn split_child(&mut self, parent: NodeId, child_idx: usize) {
        let t = self.degree;
        let child = self.nodes[parent].children[child_idx];

        let (mid_key, mid_value, right) = {
            let node = &mut self.nodes[child];
            // Keys t-1.. leave: the median plus the upper half.
            let mut upper_keys = node.keys.split_off(t - 1);
            let mut upper_values = node.values.split_off(t - 1);
            let upper_children = if node.is_leaf() {
                Vec::new()
            } else {
                node.children.split_off(t)
            };
            let mid_key = upper_keys.remove(0);
            let mid_value = upper_values.remove(0);
            (
                mid_key,
                mid_value,
                Node {
                    keys: upper_keys,
                    values: upper_values,
                    children: upper_children,
                },
            )
        };

        let right_id = self.alloc(right);
        let node = &mut self.nodes[parent];
        node.keys.insert(child_idx, mid_key);
        node.values.insert(child_idx, mid_value);
        node.children.insert(child_idx + 1, right_id);
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.remove_from(self.root, key);
        if removed.is_some() {
            self.len -= 1;
        }
        // An emptied internal root hands the tree to its only child and
        // the height shrinks by one.
        if self.nodes[self.root].keys.is_empty() && !self.nodes[self.root].is_leaf() {
            let old_root = self.root;
            self.root = self.nodes[old_root].children[0];
            self.release(old_root);
        }
        removed
    }

    /// CLRS deletion. Every node visited below the root is guaranteed to
    /// hold at least `t` entries before descent, so removal at the leaf
    /// never underflows a node on the path.
    fn remove_from(&mut self, id: NodeId, key: &K) -> Option<V> {
        let t = self.degree;
        match self.nodes[id].keys.binary_search(key) {
            Ok(i) => {
                if self.nodes[id].is_leaf() {
                    self.nodes[id].keys.remove(i);
                    return Some(self.nodes[id].values.remove(i));
                }
                let left = self.nodes[id].children[i];
                let right = self.nodes[id].children[i + 1];
                if self.nodes[left].keys.len() >= t {
                    // Replace with the predecessor pulled out of the
                    // left subtree.
                    let (pk, pv) = self.take_max(left);
                    self.nodes[id].keys[i] = pk;
                    Some(mem::replace(&mut self.nodes[id].values[i], pv))
                } else if self.nodes[right].keys.len() >= t {
                    let (sk, sv) = self.take_min(right);
                    self.nodes[id].keys[i] = sk;
                    Some(mem::replace(&mut self.nodes[id].values[i], sv))
                } else {
                    // Both neighbors are minimal: fold the key and the
                    // right child into the left child, then recurse.
                    self.merge_children(id, i);
                    self.remove_from(left, key)
                }
            }
            Err(i) => {
                if self.nodes[id].is_leaf() {
                    return None;
                }
                let i = self.ensure_child(id, i);
                let child = self.nodes[id].children[i];
                self.remove_from(child, key)
            }
        }
    }

    /// Removes and returns the greatest entry of the subtree at `id`.
    /// The subtree root holds at least `t` entries on entry.
    fn take_max(&mut self, mut id: NodeId) -> (K, V) {
        loop {
            if self.nodes[id].is_leaf() {
                let node = &mut self.nodes[id];
                let key = node.keys.pop().expect("non-empty by B-tree invariant");
                let value = node.values.pop().expect("non-empty by B-tree invariant");
                return (key, value);
            }
            let last = self.nodes[id].children.len() - 1;
            let idx = self.ensure_child(id, last);
            id = self.nodes[id].children[idx];
        }
    }

    /// Removes and returns the least entry of the subtree at `id`.
    fn take_min(&mut self, mut id: NodeId) -> (K, V) {
        loop {
            if self.nodes[id].is_leaf() {
                let node = &mut self.nodes[id];
                let key = node.keys.remove(0);
                let value = node.values.remove(0);
                return (key, value);
            }
            let idx = self.ensure_child(id, 0);
            id = self.nodes[id].children[idx];
        }
    }

    /// Guarantees the child at `i` holds at least `t` entries before
    /// descent, borrowing from a sibling or merging when it does not.
    /// Returns the (possibly shifted) index of the child to descend.
    fn ensure_child(&mut self, parent: NodeId, i: usize) -> usize {
        let t = self.degree;
        let child = self.nodes[parent].children[i];
        if self.nodes[child].keys.len() >= t {
            return i;
        }
        if i > 0 {
            let left_sibling = self.nodes[parent].children[i - 1];
            if self.nodes[left_sibling].keys.len() >= t {
                self.rotate_right(parent, i - 1);
                return i;
            }
        }
        if i + 1 < self.nodes[parent].children.len() {
            let right_sibling = self.nodes[parent].children[i + 1];
            if self.nodes[right_sibling].keys.len() >= t {
                self.rotate_left(parent, i);
                return i;
            }
        }
        if i > 0 {
            self.merge_children(parent, i - 1);
            i - 1
        } else {
            self.merge_children(parent, i);
            i
        }
    }

    /// Moves one entry from the child at `i` through the separator into
    /// the child at `i + 1`.
    fn rotate_right(&mut self, parent: NodeId, i: usize) {
        let left = self.nodes[parent].children[i];
        let right = self.nodes[parent].children[i + 1];

        let (lk, lv, lc) = {
            let node = &mut self.nodes[left];
            let lk = node.keys.pop().expect("non-empty by B-tree invariant");
            let lv = node.values.pop().expect("non-empty by B-tree invariant");
            let lc = node.children.pop();
            (lk, lv, lc)
        };
        let pk = mem::replace(&mut self.nodes[parent].keys[i], lk);
        let pv = mem::replace(&mut self.nodes[parent].values[i], lv);
        let node = &mut self.nodes[right];
        node.keys.insert(0, pk);
        node.values.insert(0, pv);
        if let Some(c) = lc {
            node.children.insert(0, c);
        }
    }

    /// Moves one entry from the child at `i + 1` through the separator
    /// into the child at `i`.
    fn rotate_left(&mut self, parent: NodeId, i: usize) {
        let left = self.nodes[parent].children[i];
        let right = self.nodes[parent].children[i + 1];

        let (rk, rv, rc) = {
            let node = &mut self.nodes[right];
            let rk = node.keys.remove(0);
            let rv = node.values.remove(0);
            let rc = if node.is_leaf() {
                None
            } else {
                Some(node.children.remove(0))
            };
            (rk, rv, rc)
        };
        let pk = mem::replace(&mut self.nodes[parent].keys[i], rk);
        let pv = mem::replace(&mut self.nodes[parent].values[i], rv);
        let node = &mut self.nodes[left];
        node.keys.push(pk);
        node.values.push(pv);
        if let Some(c) = rc {
            node.children.push(c);
        }
    }

    /// Folds the separator at `i` and the child at `i + 1` into the
    /// child at `i`, releasing the emptied right node.
    fn merge_children(&mut self, parent: NodeId, i: usize) {
        let left = self.nodes[parent].children[i];
        let right_id = self.nodes[parent].children.remove(i + 1);
        let sep_key = self.nodes[parent].keys.remove(i);
        let sep_value = self.nodes[parent].values.remove(i);

        let mut right = mem::replace(&mut self.nodes[right_id], Node::leaf());
        self.free.push(right_id);

        let node = &mut self.nodes[left];
        node.keys.push(sep_key);
        node.values.push(sep_value);
        node.keys.append(&mut right.keys);
        node.values.append(&mut right.values);
        node.children.append(&mut right.children);
    }

    /// Lazy in-order traversal of every entry with `start <= key <= end`.
    ///
    /// Subtrees wholly outside the range are pruned. The sequence is a
    /// point-in-time walk, not a live view: it is safe to mutate the
    /// tree between calls but not during one traversal (the borrow
    /// checker enforces this), and calling `range` again restarts it.
    pub fn range<'a>(&'a self, start: &'a K, end: &'a K) -> RangeIter<'a, K, V> {
        let mut iter = RangeIter {
            tree: self,
            stack: Vec::new(),
            start: Some(start),
            end: Some(end),
        };
        if start <= end {
            iter.descend(self.root);
        }
        iter
    }

    /// Lazy in-order traversal of every entry.
    pub fn iter(&self) -> RangeIter<'_, K, V> {
        let mut iter = RangeIter {
            tree: self,
            stack: Vec::new(),
            start: None,
            end: None,
        };
        iter.descend(self.root);
        iter
    }
}

/// In-order iterator over a [`BTree`], optionally bounded inclusively on
/// both ends. Created by [`BTree::range`] and [`BTree::iter`].
#[derive(Debug)]
pub struct RangeIter<'a, K, V> {
    tree: &'a BTree<K, V>,
    /// `(node, next entry index)` frames; the deepest node sits on top.
    stack: Vec<(NodeId, usize)>,
    start: Option<&'a K>,
    end: Option<&'a K>,
}

impl<'a, K: Ord, V> RangeIter<'a, K, V> {
    /// Pushes the path from `id` down to the first in-range entry,
    /// skipping subtrees entirely below the lower bound.
    fn descend(&mut self, mut id: NodeId) {
        loop {
            let node = &self.tree.nodes[id];
            let i = match self.start {
                Some(s) => node.keys.partition_point(|k| k < s),
                None => 0,
            };
            self.stack.push((id, i));
            if node.is_leaf() {
                return;
            }
            id = node.children[i];
        }
    }
}

impl<'a, K: Ord, V> Iterator for RangeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, i) = self.stack.pop()?;
            let node = &self.tree.nodes[id];
            if i >= node.keys.len() {
                // Node exhausted; the parent frame resumes.
                continue;
            }
            let key = &node.keys[i];
            if let Some(end) = self.end {
                if key > end {
                    self.stack.clear();
                    return None;
                }
            }
            self.stack.push((id, i + 1));
            if !node.is_leaf() {
                self.descend(node.children[i + 1]);
            }
            return Some((key, &node.values[i]));
        }
    }
}
