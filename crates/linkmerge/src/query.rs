//! Read-only traversal and lookup over link trees.

use crate::types::{LinkNode, LinkPath};
use std::collections::HashMap;

/// Every link in pre-order, paired with its path.
///
/// # Examples
///
/// ```
/// use linkmerge::v1::{LinkNode, query};
///
/// let base = LinkNode::new("base")
///     .with_child(LinkNode::new("shoulder").with_child(LinkNode::new("elbow")))
///     .with_child(LinkNode::new("camera"));
///
/// let order: Vec<String> = query::walk(&base)
///     .into_iter()
///     .map(|(path, _)| path.to_string())
///     .collect();
/// assert_eq!(order, ["/base", "/base/shoulder", "/base/shoulder/elbow", "/base/camera"]);
/// ```
pub fn walk(root: &LinkNode) -> Vec<(LinkPath, &LinkNode)> {
    let mut out = Vec::new();
    let mut stack = vec![(LinkPath::root(root.name()), root)];

    while let Some((path, node)) = stack.pop() {
        for child in node.children().iter().rev() {
            stack.push((path.child(child.name()), child));
        }
        out.push((path, node));
    }

    out
}

/// The links on the parent chain of `path`, root first, excluding the link
/// itself. Empty if `path` does not resolve.
pub fn ancestors<'a>(root: &'a LinkNode, path: &LinkPath) -> Vec<&'a LinkNode> {
    if root.get(path).is_none() {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut current = Some(root);
    for name in &path.names()[1..] {
        if let Some(node) = current {
            result.push(node);
            current = node.child(name);
        }
    }
    result
}

/// Paths of every link called `name`. Names are only unique among siblings,
/// so one name can appear on several branches.
pub fn find_all(root: &LinkNode, name: &str) -> Vec<LinkPath> {
    walk(root)
        .into_iter()
        .filter(|(_, node)| node.name() == name)
        .map(|(path, _)| path)
        .collect()
}

/// Links without children.
pub fn leaves(root: &LinkNode) -> Vec<(LinkPath, &LinkNode)> {
    walk(root)
        .into_iter()
        .filter(|(_, node)| node.children().is_empty())
        .collect()
}

/// Depth of the deepest link; a lone root has depth 1.
pub fn max_depth(root: &LinkNode) -> usize {
    1 + root.children().iter().map(max_depth).max().unwrap_or(0)
}

/// Build a path → link lookup map.
pub fn link_index(root: &LinkNode) -> HashMap<LinkPath, &LinkNode> {
    walk(root).into_iter().collect()
}
