use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MergeError, Result};

/// Where a link hierarchy came from.
///
/// `Existing` trees are derived live from the CAD assembly; `Loaded` trees are
/// parsed from a previously exported CSV snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Existing,
    Loaded,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Existing => write!(f, "existing"),
            Origin::Loaded => write!(f, "loaded"),
        }
    }
}

// ============================================================================
// LinkData
// ============================================================================

/// Geometric, kinematic and visual attributes of a link.
///
/// The merge core never looks inside; it only moves the payload along with
/// its node. Interpreting it is the export step's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkData(serde_json::Value);

impl LinkData {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

// ============================================================================
// LinkPath
// ============================================================================

/// Address of a link inside one tree: the names from the root down to the
/// link, root name included.
///
/// Sibling names are unique, so a path identifies at most one node. The
/// parent relation is the path minus its last segment.
///
/// # JSON shape
///
/// ```json
/// ["base_link", "shoulder", "elbow"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkPath(Vec<String>);

impl LinkPath {
    /// Path of a tree root.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of segments; a root path has depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Name of the addressed link.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path of the parent link, `None` for a root.
    pub fn parent(&self) -> Option<LinkPath> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, name: impl Into<String>) -> LinkPath {
        let mut names = self.0.clone();
        names.push(name.into());
        Self(names)
    }

    /// Strict ancestry: `self` lies on the parent chain of `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkmerge::v1::LinkPath;
    ///
    /// let base = LinkPath::from_names(["base"]);
    /// let elbow = LinkPath::from_names(["base", "shoulder", "elbow"]);
    /// assert!(base.is_ancestor_of(&elbow));
    /// assert!(!elbow.is_ancestor_of(&base));
    /// assert!(!base.is_ancestor_of(&base));
    /// ```
    pub fn is_ancestor_of(&self, other: &LinkPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &LinkPath) -> bool {
        self == other || self.is_ancestor_of(other)
    }
}

impl fmt::Display for LinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for name in &self.0 {
            write!(f, "/{}", name)?;
        }
        Ok(())
    }
}

impl FromStr for LinkPath {
    type Err = std::convert::Infallible;

    /// Parse `/base/arm` (leading slash optional, empty segments skipped).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_names(s.split('/').filter(|seg| !seg.is_empty())))
    }
}

/// A link addressed across both trees of a merge session.
///
/// Displays as `existing:/base/arm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub tree: Origin,
    pub path: LinkPath,
}

impl NodeRef {
    pub fn new(tree: Origin, path: LinkPath) -> Self {
        Self { tree, path }
    }

    pub fn existing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Origin::Existing, LinkPath::from_names(names))
    }

    pub fn loaded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Origin::Loaded, LinkPath::from_names(names))
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tree, self.path)
    }
}

// ============================================================================
// LinkNode
// ============================================================================

/// One robot link and the subtree hanging off it.
///
/// A parent owns its children outright; child order is the assembly's display
/// order and is preserved by every operation unless an explicit insertion
/// index is given. Sibling names are unique.
///
/// # JSON shape
///
/// ```json
/// {
///   "name": "base_link",
///   "link": { "mass": 1.2 },
///   "children": [ { "name": "shoulder" } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkNode {
    name: String,
    #[serde(default, skip_serializing_if = "LinkData::is_empty")]
    link: LinkData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<LinkNode>,
}

impl LinkNode {
    /// Create a leaf link with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: LinkData::default(),
            children: Vec::new(),
        }
    }

    /// Set the payload.
    pub fn with_link(mut self, link: LinkData) -> Self {
        self.link = link;
        self
    }

    /// Append a child while building a tree.
    ///
    /// No name check happens here; [`TreeSnapshot::new`] validates the
    /// finished tree.
    pub fn with_child(mut self, child: LinkNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &LinkData {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkData {
        &mut self.link
    }

    pub fn children(&self) -> &[LinkNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&LinkNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Index of the named child.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }

    /// Insert `child` under this node and return the index it landed at.
    ///
    /// `at` defaults to the end and is clamped to the current child count.
    /// Since `child` is owned it cannot be an ancestor of `self`; cycles are
    /// ruled out by the caller that detached it (see
    /// [`ReparentEngine`](crate::reparent::ReparentEngine)).
    ///
    /// # Examples
    ///
    /// ```
    /// use linkmerge::v1::LinkNode;
    ///
    /// let mut base = LinkNode::new("base").with_child(LinkNode::new("arm"));
    /// assert_eq!(base.attach(LinkNode::new("wrist"), Some(0)).unwrap(), 0);
    /// assert!(base.attach(LinkNode::new("arm"), None).is_err());
    /// assert_eq!(base.children()[1].name(), "arm");
    /// ```
    pub fn attach(&mut self, child: LinkNode, at: Option<usize>) -> Result<usize> {
        if self.child(&child.name).is_some() {
            return Err(MergeError::DuplicateName {
                parent: LinkPath::root(self.name.clone()).to_string(),
                name: child.name,
            });
        }
        Ok(self.insert_child(child, at.unwrap_or(self.children.len())))
    }

    /// Insert without the name check; callers have already ruled out a clash.
    pub(crate) fn insert_child(&mut self, child: LinkNode, index: usize) -> usize {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        index
    }

    /// Remove the named child and return it with its whole subtree.
    pub fn detach(&mut self, name: &str) -> Option<LinkNode> {
        let index = self.position(name)?;
        Some(self.children.remove(index))
    }

    /// Depth-first, pre-order search of this subtree (self included).
    pub fn find(&self, name: &str) -> Option<&LinkNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Like [`find`](Self::find) but returns the address of the match,
    /// rooted at this node.
    pub fn path_of(&self, name: &str) -> Option<LinkPath> {
        let mut trail = Vec::new();
        if self.path_of_inner(name, &mut trail) {
            Some(LinkPath(trail))
        } else {
            None
        }
    }

    fn path_of_inner(&self, name: &str, trail: &mut Vec<String>) -> bool {
        trail.push(self.name.clone());
        if self.name == name || self.children.iter().any(|c| c.path_of_inner(name, trail)) {
            return true;
        }
        trail.pop();
        false
    }

    /// Resolve a path whose first segment names this node.
    pub fn get(&self, path: &LinkPath) -> Option<&LinkNode> {
        let (first, rest) = path.0.split_first()?;
        if *first != self.name {
            return None;
        }
        rest.iter().try_fold(self, |node, name| node.child(name))
    }

    pub fn get_mut(&mut self, path: &LinkPath) -> Option<&mut LinkNode> {
        let (first, rest) = path.0.split_first()?;
        if *first != self.name {
            return None;
        }
        let mut node = self;
        for name in rest {
            node = node.children.iter_mut().find(|c| c.name == *name)?;
        }
        Some(node)
    }

    /// Number of links in this subtree, self included.
    pub fn link_count(&self) -> usize {
        1 + self.children.iter().map(LinkNode::link_count).sum::<usize>()
    }

    /// Check sibling-name uniqueness across the whole subtree.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(&LinkPath::root(self.name.clone()))
    }

    fn validate_at(&self, here: &LinkPath) -> Result<()> {
        for (i, child) in self.children.iter().enumerate() {
            if self.children[..i].iter().any(|c| c.name == child.name) {
                return Err(MergeError::DuplicateName {
                    parent: here.to_string(),
                    name: child.name.clone(),
                });
            }
            child.validate_at(&here.child(child.name.clone()))?;
        }
        Ok(())
    }
}

// ============================================================================
// TreeSnapshot
// ============================================================================

/// A link tree plus where it came from.
///
/// `source_label` is the assembly's display name for the existing tree and
/// the CSV file path for the loaded one; it feeds the user-facing labels and
/// never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields")]
pub struct TreeSnapshot {
    origin: Origin,
    source_label: String,
    root: LinkNode,
}

/// Unvalidated wire form; every deserialized snapshot passes through
/// [`TreeSnapshot::new`].
#[derive(Deserialize)]
struct SnapshotFields {
    origin: Origin,
    source_label: String,
    root: LinkNode,
}

impl TryFrom<SnapshotFields> for TreeSnapshot {
    type Error = MergeError;

    fn try_from(fields: SnapshotFields) -> Result<Self> {
        Self::new(fields.origin, fields.source_label, fields.root)
    }
}

impl TreeSnapshot {
    /// Wrap a finished tree. Fails with `DuplicateName` if any parent lists
    /// two children with the same name.
    pub fn new(origin: Origin, source_label: impl Into<String>, root: LinkNode) -> Result<Self> {
        root.validate()?;
        Ok(Self {
            origin,
            source_label: source_label.into(),
            root,
        })
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn root(&self) -> &LinkNode {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut LinkNode {
        &mut self.root
    }

    /// Parse and validate a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let fields: SnapshotFields = serde_json::from_str(json)?;
        Self::try_from(fields)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
