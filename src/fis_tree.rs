//! The FIS-tree itself: one RL-tree layer per classification dimension, each
//! elementary interval annotated with the best (lowest-cost) rule that
//! covers it, plus a coarser "root" node per layer that covers the whole
//! dimension. Querying checks both the precise cell and its layer's root —
//! the "fat" part of "fat inverted segment tree" — because a rule whose
//! earlier dimensions matched broadly can still be the best match even when
//! this dimension's elementary interval itself found nothing better.

use std::sync::Arc;

use crate::rl_tree::{self, RlTree};
use crate::rule::{Handle, Rule};

pub(crate) const WORST_COST: i32 = i32::MAX;

/// One node of one dimension's layer. Every node, whether it sits at an
/// elementary interval or is a layer's root, has the same shape: the best
/// matching rule (if any) and, if this isn't the last dimension, the next
/// dimension's sub-tree built over only the rules that reached this cell.
pub(crate) struct FisNode<const D: usize, A> {
    /// Cost of the best rule covering this cell, or [`WORST_COST`] if none.
    pub(crate) cost: i32,
    /// The matching rule, populated only on the last dimension.
    pub(crate) rule: Option<Arc<Rule<D, A>>>,
    /// The next dimension's RL-tree, populated on every dimension but the
    /// last.
    pub(crate) next_rl: Option<Arc<RlTree<Arc<FisNode<D, A>>>>>,
    /// Incremental-update overlay. The reference structure supports patching
    /// a built tree with rule insertions/removals without a full rebuild;
    /// this crate only builds from scratch, so it is always `None`, kept as
    /// a field so that future incremental support doesn't change the node
    /// shape.
    #[allow(dead_code)]
    pub(crate) delta: Option<Vec<Arc<Rule<D, A>>>>,
    /// This layer's root FIS node, shared by every elementary interval in
    /// the layer. Always `None` on the root itself, which is what makes the
    /// parent graph acyclic and plain `Arc` reference counting sufficient
    /// for teardown.
    pub(crate) parent: Option<Arc<FisNode<D, A>>>,
}

/// A built, immutable classifier over `D` dimensions with an opaque action
/// type `A`.
pub struct Classifier<const D: usize, A> {
    rules: Vec<Arc<Rule<D, A>>>,
    root: Arc<RlTree<Arc<FisNode<D, A>>>>,
    max_dim: usize,
    log: slog::Logger,
}

fn next_projection<const D: usize, A>(
    rules: &[Arc<Rule<D, A>>],
    proj: &[Handle],
    dim: usize,
    begin: u32,
    end: u32,
) -> Vec<Handle> {
    proj.iter()
        .copied()
        .filter(|h| h.field(rules, dim).contains_range(begin, end))
        .collect()
}

fn make_fis_node<const D: usize, A>(
    rules: &[Arc<Rule<D, A>>],
    proj: &[Handle],
    dim: usize,
    max_dim: usize,
    begin: u32,
    end: u32,
    parent: Option<Arc<FisNode<D, A>>>,
    log: &slog::Logger,
) -> Arc<FisNode<D, A>> {
    let nextp = next_projection(rules, proj, dim, begin, end);
    let (cost, rule, next_rl) = match nextp.first() {
        None => (WORST_COST, None, None),
        Some(best) => {
            let best_rule = rules[best.rule_index()].clone();
            let cost = best_rule.cost;
            if dim == max_dim {
                (cost, Some(best_rule), None)
            } else {
                let sub = build_layer(rules, &nextp, dim + 1, max_dim, log);
                (cost, None, Some(sub))
            }
        }
    };
    Arc::new(FisNode {
        cost,
        rule,
        next_rl,
        delta: None,
        parent,
    })
}

fn build_layer<const D: usize, A>(
    rules: &[Arc<Rule<D, A>>],
    proj: &[Handle],
    dim: usize,
    max_dim: usize,
    log: &slog::Logger,
) -> Arc<RlTree<Arc<FisNode<D, A>>>> {
    let rootf = make_fis_node(rules, proj, dim, max_dim, 0, 0, None, log);

    let keys: Vec<u32> = proj
        .iter()
        .flat_map(|h| h.field(rules, dim).endpoints())
        .collect();

    if keys.is_empty() {
        slog::trace!(log, "dim {}: no endpoints, degenerate layer", dim);
        return Arc::new(RlTree::Null(rootf));
    }

    let skeleton = rl_tree::make(&keys).expect("nonempty endpoints produce a tree");
    slog::trace!(log, "dim {}: {} distinct endpoints", dim, keys.len());
    let parent_for_leaves = rootf.clone();
    let tree = rl_tree::attach(skeleton, 0, 0, &mut |b, e| {
        make_fis_node(rules, proj, dim, max_dim, b, e, Some(parent_for_leaves.clone()), log)
    });
    Arc::new(RlTree::Real(tree))
}

/// Build a classifier from a rule set. Returns `None` if no rule is active
/// (every rule has `cost <= 0`), which is a legal, empty classifier rather
/// than an error: every query against it simply finds nothing.
///
/// `max_dim` is the highest dimension index to classify on (0-based, so a
/// 5-tuple classifier over the full `D = 5` array passes `max_dim = 4`);
/// it lets a caller build a classifier that ignores trailing dimensions of
/// `Rule` without changing `D`.
pub fn build<const D: usize, A>(
    rules: Vec<Rule<D, A>>,
    max_dim: usize,
) -> Result<Option<Classifier<D, A>>, crate::error::BuildError> {
    use crate::error::BuildError;

    if D > crate::rule::MAX_DIM {
        return Err(BuildError::TooManyDimensions(D));
    }
    if max_dim >= D {
        return Err(BuildError::MaxDimOutOfRange { max_dim, dims: D });
    }
    for rule in &rules {
        for (dim, field) in rule.field.iter().enumerate() {
            if let crate::interval::Interval::Range(r) = field {
                if r.end != 0 && r.begin >= r.end {
                    return Err(BuildError::InvalidRange {
                        name: rule.name.clone(),
                        dim,
                        begin: r.begin,
                        end: r.end,
                    });
                }
            }
        }
    }

    let log = crate::logging::default_logger();
    let rules: Vec<Arc<Rule<D, A>>> = rules.into_iter().map(Arc::new).collect();

    let mut projection = Vec::new();
    for (i, r) in rules.iter().enumerate() {
        if r.is_active() {
            projection.push(Handle::Forward(i));
            if r.is_bidirectional() {
                projection.push(Handle::Inverse(i));
            }
        }
    }
    if projection.is_empty() {
        slog::info!(log, "build: no active rules");
        return Ok(None);
    }
    projection.sort_by_key(|h| rules[h.rule_index()].cost.unsigned_abs());
    slog::debug!(
        log, "build: classifier over {} dimensions", max_dim + 1;
        "rules" => rules.len(), "active_handles" => projection.len()
    );

    let root = build_layer(&rules, &projection, 0, max_dim, &log);
    Ok(Some(Classifier {
        rules,
        root,
        max_dim,
        log,
    }))
}

impl<const D: usize, A> Classifier<D, A> {
    /// Classify `value` and return the best-cost matching rule's action, if
    /// any. Walks each dimension's elementary interval and, before moving
    /// on, that dimension's layer root too, since a rule can be the overall
    /// best match without being the best match for every individual
    /// dimension it passed through.
    pub fn query(&self, value: [u32; D]) -> Option<Arc<Rule<D, A>>> {
        let mut parent: Vec<Option<Arc<FisNode<D, A>>>> = (0..D).map(|_| None).collect();
        let mut current: Option<Arc<RlTree<Arc<FisNode<D, A>>>>> = Some(self.root.clone());
        let mut cost = WORST_COST;
        let mut rule = None;
        let mut dim: isize = 0;

        while dim >= 0 {
            let d = dim as usize;

            // `from_root_pop` distinguishes the two ways a cell can be
            // solved here: popped off `parent[d]` (the layer's fat root,
            // already the coarsest thing there is to check in this
            // dimension) versus freshly descended to (an elementary cell,
            // whose enclosing root was just stashed in `parent[d]` and must
            // still be consulted before giving up on this dimension).
            let (leaf, from_root_pop) = if let Some(leaf) = parent[d].take() {
                (Some(leaf), true)
            } else {
                match current.take() {
                    None => (None, false),
                    Some(rl) => match rl.as_ref() {
                        RlTree::Null(leaf) => (Some(leaf.clone()), true),
                        RlTree::Real(node) => {
                            let leaf_node = rl_tree::descend_to_leaf(node, value[d]);
                            let fis = rl_tree::leaf_child(leaf_node, value[d]).clone();
                            parent[d] = fis.parent.clone();
                            (Some(fis), false)
                        }
                    },
                }
            };

            let Some(leaf) = leaf else {
                dim -= 1;
                continue;
            };

            if leaf.cost < cost {
                if d == self.max_dim {
                    cost = leaf.cost;
                    rule = leaf.rule.clone();
                    dim -= 1;
                } else {
                    current = leaf.next_rl.clone();
                    dim += 1;
                }
            } else if from_root_pop {
                dim -= 1;
            }
            // Else: this cell came from a fresh descent and didn't improve,
            // but `parent[d]` now holds its enclosing root — re-enter the
            // loop at the same `dim` so that root gets checked before this
            // dimension is abandoned.
        }

        slog::trace!(self.log, "query"; "value" => format!("{:?}", value), "matched" => rule.is_some());
        rule
    }

    /// Number of rules the classifier was built from (active and inactive).
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Tear a classifier down. Equivalent to dropping it; kept as an explicit
/// operation so build/query/destroy read as a matched trio at call sites.
/// Every `FisNode` is reached only through `Arc`s rooted at the classifier
/// (the parent pointer inside a node never points back into anything that
/// holds a strong reference to that node), so ordinary `Drop` reclaims the
/// whole tree with no cycles to break.
pub fn destroy<const D: usize, A>(classifier: Option<Classifier<D, A>>) {
    drop(classifier)
}
