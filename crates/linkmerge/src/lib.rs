#![doc = include_str!("../README.md")]

mod error;
mod labels;
mod menu;
mod observe;
mod plan;
mod query;
mod reparent;
mod selection;
mod session;
mod types;

pub mod v1 {
    //! Versioned public API for link-tree reconciliation.
    //!
    //! Everything you need is re-exported from this module. Types are organized
    //! into four groups:
    //!
    //! # Trees
    //!
    //! - [`LinkNode`]: one link and its ordered, uniquely named children
    //! - [`LinkData`]: the link's opaque payload
    //! - [`TreeSnapshot`]: a tree tagged with its [`Origin`] and source label
    //! - [`LinkPath`], [`NodeRef`]: addressing within one tree / across both
    //!
    //! # Editing
    //!
    //! - [`MergeSession`]: the two trees plus per-category source choice
    //! - [`ReparentEngine`], [`TreePair`]: validated subtree moves
    //! - [`PropertySourceSelection`], [`Category`], [`SourceMap`]: which
    //!   origin supplies each property group
    //! - [`MergePlan`], [`MergeOp`]: serialized edits for headless replay
    //!
    //! # Output
    //!
    //! - [`MergeResult`]: what the export step receives
    //! - [`ReferenceGeometry`]: checked coordinate system and axis
    //!
    //! # Presentation support
    //!
    //! - [`SessionEvent`], [`SelectionChanged`], [`SubscriptionId`]:
    //!   change notification
    //! - [`labels`]: captions and tooltips for the dialog
    //! - [`ChoiceMenu`], [`ReferenceMenus`]: reference-geometry menus
    //!
    //! # Example: restructure and pick sources
    //!
    //! ```
    //! use linkmerge::v1::*;
    //!
    //! let existing = TreeSnapshot::new(
    //!     Origin::Existing,
    //!     "4_WHEELER",
    //!     LinkNode::new("chassis").with_child(LinkNode::new("front_axle")),
    //! ).unwrap();
    //! let loaded = TreeSnapshot::new(
    //!     Origin::Loaded,
    //!     "4_WHEELER.csv",
    //!     LinkNode::new("chassis").with_child(LinkNode::new("rear_axle")),
    //! ).unwrap();
    //!
    //! let mut session = MergeSession::new(existing, loaded).unwrap();
    //! session.move_node(
    //!     &NodeRef::loaded(["chassis", "rear_axle"]),
    //!     &NodeRef::existing(["chassis"]),
    //!     None,
    //! ).unwrap();
    //! session.select_source(Category::JointKinematics, Origin::Loaded).unwrap();
    //!
    //! let result = session.finalize().unwrap();
    //! let names: Vec<&str> = result.existing.root().children().iter().map(|c| c.name()).collect();
    //! assert_eq!(names, ["front_axle", "rear_axle"]);
    //! assert_eq!(result.sources.get(Category::JointKinematics), Origin::Loaded);
    //! assert_eq!(result.sources.get(Category::Visual), Origin::Existing);
    //! ```

    /// Read-only traversal of link trees.
    ///
    /// # Example: list every link with its path
    ///
    /// ```
    /// use linkmerge::v1::{LinkNode, query};
    ///
    /// let root = LinkNode::new("base").with_child(LinkNode::new("arm"));
    /// let paths: Vec<String> = query::walk(&root).iter().map(|(p, _)| p.to_string()).collect();
    /// assert_eq!(paths, ["/base", "/base/arm"]);
    /// ```
    pub mod query {
        pub use crate::query::{ancestors, find_all, leaves, link_index, max_depth, walk};
    }

    /// Captions and tooltips for the merge dialog.
    pub mod labels {
        pub use crate::labels::{
            BUTTON_WIDTH, Caption, HEADING_WIDTH, SessionLabels, SourceRow, category_description,
            shorten_label, source_tooltip, tree_heading,
        };
    }

    pub use crate::error::{MergeError, Result};
    pub use crate::menu::{ChoiceMenu, ReferenceGeometry, ReferenceMenu, ReferenceMenus};
    pub use crate::observe::SubscriptionId;
    pub use crate::plan::{MergeOp, MergePlan};
    pub use crate::reparent::{MoveOutcome, MovePlan, ReparentEngine, TreePair};
    pub use crate::selection::{Category, PropertySourceSelection, SelectionChanged, SourceMap};
    pub use crate::session::{
        MergeResult, MergeSession, SessionEvent, SessionState, allowed_transitions,
    };
    pub use crate::types::{LinkData, LinkNode, LinkPath, NodeRef, Origin, TreeSnapshot};
}
