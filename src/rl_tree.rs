//! The (2,4)-tree used to solve the per-dimension Range Location problem.
//!
//! Every node holds 1-3 strictly increasing keys and one more child than it
//! has keys. A node is either a *leaf*, whose children are the elementary
//! intervals it induces, or *internal*, whose children are further nodes of
//! this same tree. There is no up-pointer from a node to its parent; the
//! reference implementation locates a node's parent by re-descending from
//! the root and comparing keys, which only terminates correctly because the
//! node being searched for always sits exactly where that descent leads.
//! This module gets the identical tree shapes (and the identical 0/1/2/3-key
//! absorption table and 3-key split) by running the search and the
//! insertion as one structural recursion instead: `insert_into` descends to
//! the right spot, and a node that overflows its 3-key capacity returns a
//! `Split` that its caller merges in at the level above, which is exactly
//! the propagation the reference implementation's `while` loop in
//! `tftree_insert` achieves by repeated re-descent.

use std::fmt;

/// A node of the (2,4)-tree. `L` is the payload type attached to leaves:
/// `()` while only the key structure is being built, and the caller's real
/// leaf type (a FIS node) once [`attach`] has run.
pub(crate) struct Node<L> {
    keys: Vec<u32>,
    body: Body<L>,
}

enum Body<L> {
    Internal(Vec<Box<Node<L>>>),
    Leaf(Vec<L>),
}

/// A whole RL-tree for one dimension's layer. `Null` is the degenerate
/// single-cell tree used when every projected rule is `AnyToAny` in this
/// dimension (so there are no endpoints to key on).
pub(crate) enum RlTree<L> {
    Null(L),
    Real(Box<Node<L>>),
}

impl<L> fmt::Debug for Node<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("keys", &self.keys)
            .field(
                "arity",
                &match &self.body {
                    Body::Internal(c) => c.len(),
                    Body::Leaf(c) => c.len(),
                },
            )
            .finish()
    }
}

fn child_index(keys: &[u32], value: u32) -> usize {
    keys.iter().position(|&k| value < k).unwrap_or(keys.len())
}

fn insert_sorted(keys: &mut Vec<u32>, key: u32) -> usize {
    let pos = keys.iter().position(|&k| key < k).unwrap_or(keys.len());
    keys.insert(pos, key);
    pos
}

enum InsertOutcome<L> {
    Absorbed(Box<Node<L>>),
    Split {
        left: Box<Node<L>>,
        promoted: u32,
        right: Box<Node<L>>,
    },
}

/// Split a node that has just grown to 4 keys / 5 children into two
/// siblings plus a promoted middle key, per the merge/split table: the
/// middle key (index 2 of the 4 ordered keys) is promoted, the low two keys
/// and their three children become the left sibling, and the high key and
/// its two children become the right sibling. Both siblings are the same
/// kind (leaf or internal) the overflowing node was.
fn split_overflow<L>(node: Box<Node<L>>) -> (Box<Node<L>>, u32, Box<Node<L>>) {
    let Node { mut keys, body } = *node;
    debug_assert_eq!(keys.len(), 4);
    let right_keys = keys.split_off(3);
    let promoted = keys.pop().unwrap();
    let left_keys = keys;
    match body {
        Body::Leaf(mut payload) => {
            debug_assert_eq!(payload.len(), 5);
            let right_payload = payload.split_off(3);
            let left_payload = payload;
            (
                Box::new(Node {
                    keys: left_keys,
                    body: Body::Leaf(left_payload),
                }),
                promoted,
                Box::new(Node {
                    keys: right_keys,
                    body: Body::Leaf(right_payload),
                }),
            )
        }
        Body::Internal(mut children) => {
            debug_assert_eq!(children.len(), 5);
            let right_children = children.split_off(3);
            let left_children = children;
            (
                Box::new(Node {
                    keys: left_keys,
                    body: Body::Internal(left_children),
                }),
                promoted,
                Box::new(Node {
                    keys: right_keys,
                    body: Body::Internal(right_children),
                }),
            )
        }
    }
}

fn maybe_split<L>(node: Box<Node<L>>) -> InsertOutcome<L> {
    if node.keys.len() <= 3 {
        InsertOutcome::Absorbed(node)
    } else {
        let (left, promoted, right) = split_overflow(node);
        InsertOutcome::Split {
            left,
            promoted,
            right,
        }
    }
}

fn insert_into<L: Default>(node: Box<Node<L>>, key: u32) -> InsertOutcome<L> {
    let Node { mut keys, body } = *node;
    match body {
        Body::Leaf(mut payload) => {
            let pos = insert_sorted(&mut keys, key);
            payload.insert(pos + 1, L::default());
            maybe_split(Box::new(Node {
                keys,
                body: Body::Leaf(payload),
            }))
        }
        Body::Internal(mut children) => {
            let idx = child_index(&keys, key);
            let child = children.remove(idx);
            match insert_into(child, key) {
                InsertOutcome::Absorbed(child) => {
                    children.insert(idx, child);
                    InsertOutcome::Absorbed(Box::new(Node {
                        keys,
                        body: Body::Internal(children),
                    }))
                }
                InsertOutcome::Split {
                    left,
                    promoted,
                    right,
                } => {
                    children.insert(idx, left);
                    children.insert(idx + 1, right);
                    insert_sorted(&mut keys, promoted);
                    maybe_split(Box::new(Node {
                        keys,
                        body: Body::Internal(children),
                    }))
                }
            }
        }
    }
}

/// Insert `key` into the key-only skeleton, growing or splitting nodes per
/// the merge table. Returns a fresh root.
pub(crate) fn insert<L: Default>(root: Option<Box<Node<L>>>, key: u32) -> Box<Node<L>> {
    match root {
        None => Box::new(Node {
            keys: vec![key],
            body: Body::Leaf(vec![L::default(), L::default()]),
        }),
        Some(node) => match insert_into(node, key) {
            InsertOutcome::Absorbed(node) => node,
            InsertOutcome::Split {
                left,
                promoted,
                right,
            } => Box::new(Node {
                keys: vec![promoted],
                body: Body::Internal(vec![left, right]),
            }),
        },
    }
}

/// Does any node on the path to `key` already carry it? Keys live at
/// whichever level they were promoted to, so this checks every node along
/// the descent, not just leaves.
pub(crate) fn find<L>(root: Option<&Node<L>>, key: u32) -> bool {
    let mut node = match root {
        None => return false,
        Some(n) => n,
    };
    loop {
        if node.keys.contains(&key) {
            return true;
        }
        match &node.body {
            Body::Leaf(_) => return false,
            Body::Internal(children) => {
                node = &children[child_index(&node.keys, key)];
            }
        }
    }
}

/// Build the key skeleton for a set of endpoints: insert every nonzero key
/// not already present. A key of 0 is never inserted (it is reserved for
/// the unbounded upper sentinel of the enclosing cell).
pub(crate) fn make(keys: &[u32]) -> Option<Box<Node<()>>> {
    let mut root: Option<Box<Node<()>>> = None;
    for &key in keys {
        if key == 0 || find(root.as_deref(), key) {
            continue;
        }
        root = Some(insert(root, key));
    }
    root
}

/// Descend to the leaf that owns `value`.
pub(crate) fn descend_to_leaf<L>(mut node: &Node<L>, value: u32) -> &Node<L> {
    loop {
        match &node.body {
            Body::Leaf(_) => return node,
            Body::Internal(children) => {
                node = &children[child_index(&node.keys, value)];
            }
        }
    }
}

/// Given a leaf (as returned by [`descend_to_leaf`]), the elementary
/// interval's payload that contains `value`.
pub(crate) fn leaf_child<'a, L>(leaf: &'a Node<L>, value: u32) -> &'a L {
    match &leaf.body {
        Body::Leaf(payload) => &payload[child_index(&leaf.keys, value)],
        Body::Internal(_) => panic!("leaf_child called on an internal node"),
    }
}

/// Replace every leaf's placeholder payload with the real payload computed
/// from the elementary interval it covers, threading `[begin, end)` down
/// through the tree exactly as the key-only skeleton subdivides it: a node
/// with keys `k0..kn` covering `[begin, end)` induces sub-intervals
/// `[begin,k0), [k0,k1), ..., [kn,end)`.
pub(crate) fn attach<L>(
    node: Box<Node<()>>,
    begin: u32,
    end: u32,
    make_leaf: &mut impl FnMut(u32, u32) -> L,
) -> Box<Node<L>> {
    let Node { keys, body } = *node;
    let mut bounds = Vec::with_capacity(keys.len() + 1);
    let mut lo = begin;
    for &k in &keys {
        bounds.push((lo, k));
        lo = k;
    }
    bounds.push((lo, end));

    let body = match body {
        Body::Leaf(placeholders) => {
            debug_assert_eq!(placeholders.len(), bounds.len());
            Body::Leaf(
                bounds
                    .into_iter()
                    .map(|(b, e)| make_leaf(b, e))
                    .collect(),
            )
        }
        Body::Internal(children) => {
            debug_assert_eq!(children.len(), bounds.len());
            Body::Internal(
                children
                    .into_iter()
                    .zip(bounds)
                    .map(|(c, (b, e))| attach(c, b, e, make_leaf))
                    .collect(),
            )
        }
    };
    Box::new(Node { keys, body })
}
