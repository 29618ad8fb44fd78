//! Validated subtree moves within and across the two trees of a merge.

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::types::{LinkNode, LinkPath, NodeRef, Origin, TreeSnapshot};

/// The existing and loaded snapshots, slotted by origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TreePair {
    existing: TreeSnapshot,
    loaded: TreeSnapshot,
}

impl TreePair {
    /// Pair two snapshots in either order. Fails with `Configuration` when
    /// both carry the same origin tag.
    pub fn new(a: TreeSnapshot, b: TreeSnapshot) -> Result<Self> {
        match (a.origin(), b.origin()) {
            (Origin::Existing, Origin::Loaded) => Ok(Self {
                existing: a,
                loaded: b,
            }),
            (Origin::Loaded, Origin::Existing) => Ok(Self {
                existing: b,
                loaded: a,
            }),
            (same, _) => Err(MergeError::Configuration(same)),
        }
    }

    pub fn snapshot(&self, origin: Origin) -> &TreeSnapshot {
        match origin {
            Origin::Existing => &self.existing,
            Origin::Loaded => &self.loaded,
        }
    }

    pub fn tree(&self, origin: Origin) -> &LinkNode {
        self.snapshot(origin).root()
    }

    fn tree_mut(&mut self, origin: Origin) -> &mut LinkNode {
        match origin {
            Origin::Existing => self.existing.root_mut(),
            Origin::Loaded => self.loaded.root_mut(),
        }
    }

    pub fn resolve(&self, node: &NodeRef) -> Option<&LinkNode> {
        self.tree(node.tree).get(&node.path)
    }

    fn resolve_mut(&mut self, node: &NodeRef) -> Option<&mut LinkNode> {
        self.tree_mut(node.tree).get_mut(&node.path)
    }

    /// `(existing, loaded)`
    pub fn into_parts(self) -> (TreeSnapshot, TreeSnapshot) {
        (self.existing, self.loaded)
    }
}

/// What a successful move did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The subtree now lives at `to`, at position `index` under its parent.
    Moved {
        from: NodeRef,
        to: NodeRef,
        index: usize,
    },
    /// Source already sat at the requested parent and position.
    Unchanged { node: NodeRef, index: usize },
}

impl MoveOutcome {
    /// Where the moved node lives after the call.
    pub fn node(&self) -> &NodeRef {
        match self {
            MoveOutcome::Moved { to, .. } => to,
            MoveOutcome::Unchanged { node, .. } => node,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, MoveOutcome::Unchanged { .. })
    }
}

/// A move that passed every check. Applying it cannot hit a name clash or
/// a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    source: NodeRef,
    old_parent: LinkPath,
    old_index: usize,
    target_parent: NodeRef,
    index: usize,
}

impl MovePlan {
    pub fn source(&self) -> &NodeRef {
        &self.source
    }

    pub fn target_parent(&self) -> &NodeRef {
        &self.target_parent
    }

    /// Final position under the target parent.
    pub fn index(&self) -> usize {
        self.index
    }

    fn is_identity(&self) -> bool {
        self.source.tree == self.target_parent.tree
            && self.old_parent == self.target_parent.path
            && self.old_index == self.index
    }

    fn destination(&self) -> NodeRef {
        let name = self.source.path.leaf().unwrap_or_default();
        NodeRef::new(self.target_parent.tree, self.target_parent.path.child(name))
    }
}

/// Moves whole subtrees between parents, in the same tree or across trees.
///
/// Every check runs against the untouched trees before anything is
/// detached, so a rejected move leaves both trees exactly as they were.
///
/// `at` is the index the node should occupy among the target's children
/// once the move is done, clamped to the number of those children not
/// counting the node itself; `None` appends.
///
/// # Examples
///
/// ```
/// use linkmerge::v1::{LinkNode, NodeRef, Origin, ReparentEngine, TreePair, TreeSnapshot};
///
/// let existing = TreeSnapshot::new(
///     Origin::Existing,
///     "arm.SLDASM",
///     LinkNode::new("base").with_child(LinkNode::new("arm1")),
/// ).unwrap();
/// let loaded = TreeSnapshot::new(
///     Origin::Loaded,
///     "arm.csv",
///     LinkNode::new("base").with_child(LinkNode::new("gripper")),
/// ).unwrap();
/// let mut trees = TreePair::new(existing, loaded).unwrap();
///
/// let outcome = ReparentEngine::move_node(
///     &mut trees,
///     &NodeRef::loaded(["base", "gripper"]),
///     &NodeRef::existing(["base", "arm1"]),
///     None,
/// ).unwrap();
///
/// assert_eq!(outcome.node(), &NodeRef::existing(["base", "arm1", "gripper"]));
/// assert!(trees.tree(Origin::Loaded).children().is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReparentEngine;

impl ReparentEngine {
    /// Validate a move without touching the trees.
    pub fn plan(
        trees: &TreePair,
        source: &NodeRef,
        target_parent: &NodeRef,
        at: Option<usize>,
    ) -> Result<MovePlan> {
        trees.resolve(source).ok_or_else(|| not_found(source))?;
        let target = trees
            .resolve(target_parent)
            .ok_or_else(|| not_found(target_parent))?;

        if source.tree == target_parent.tree && source.path.contains(&target_parent.path) {
            return Err(MergeError::Cycle {
                source_path: source.to_string(),
                target: target_parent.to_string(),
            });
        }

        let (old_parent, name) = match (source.path.parent(), source.path.leaf()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(MergeError::RootMove(source.to_string())),
        };

        let old_index = trees
            .tree(source.tree)
            .get(&old_parent)
            .and_then(|p| p.position(name))
            .ok_or_else(|| not_found(source))?;

        let same_parent = source.tree == target_parent.tree && old_parent == target_parent.path;
        if !same_parent && target.child(name).is_some() {
            return Err(MergeError::DuplicateName {
                parent: target_parent.path.to_string(),
                name: name.to_string(),
            });
        }

        let available = if same_parent {
            target.children().len() - 1
        } else {
            target.children().len()
        };
        let index = at.unwrap_or(available).min(available);

        Ok(MovePlan {
            source: source.clone(),
            old_parent,
            old_index,
            target_parent: target_parent.clone(),
            index,
        })
    }

    /// Carry out a plan produced by [`plan`](Self::plan).
    ///
    /// The plan is re-checked against the trees as they are now, so a plan
    /// that went stale fails cleanly instead of half-applying.
    pub fn apply(trees: &mut TreePair, plan: &MovePlan) -> Result<MoveOutcome> {
        let plan = Self::plan(trees, &plan.source, &plan.target_parent, Some(plan.index))?;
        if plan.is_identity() {
            return Ok(MoveOutcome::Unchanged {
                node: plan.source.clone(),
                index: plan.index,
            });
        }

        let name = plan.source.path.leaf().unwrap_or_default().to_string();
        let old_parent = NodeRef::new(plan.source.tree, plan.old_parent.clone());
        let node = trees
            .resolve_mut(&old_parent)
            .and_then(|p| p.detach(&name))
            .ok_or_else(|| not_found(&plan.source))?;

        if let Some(target) = trees.resolve_mut(&plan.target_parent) {
            target.insert_child(node, plan.index);
        } else {
            if let Some(parent) = trees.resolve_mut(&old_parent) {
                parent.insert_child(node, plan.old_index);
            }
            return Err(not_found(&plan.target_parent));
        }

        Ok(MoveOutcome::Moved {
            from: plan.source.clone(),
            to: plan.destination(),
            index: plan.index,
        })
    }

    /// Validate and apply in one call.
    pub fn move_node(
        trees: &mut TreePair,
        source: &NodeRef,
        target_parent: &NodeRef,
        at: Option<usize>,
    ) -> Result<MoveOutcome> {
        let plan = match Self::plan(trees, source, target_parent, at) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(%source, target = %target_parent, error = %err, "move rejected");
                return Err(err);
            }
        };
        let outcome = Self::apply(trees, &plan)?;
        match &outcome {
            MoveOutcome::Moved { from, to, index } => {
                tracing::debug!(%from, %to, index, "link moved");
            }
            MoveOutcome::Unchanged { node, .. } => {
                tracing::debug!(%node, "move left link in place");
            }
        }
        Ok(outcome)
    }
}

fn not_found(node: &NodeRef) -> MergeError {
    MergeError::NodeNotFound {
        tree: node.tree,
        path: node.path.clone(),
    }
}
