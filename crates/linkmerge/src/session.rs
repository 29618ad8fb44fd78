//! The unit of work a merge dialog edits and hands to export.

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::labels::SessionLabels;
use crate::menu::{ReferenceGeometry, ReferenceMenu, ReferenceMenus};
use crate::observe::{Notifier, SubscriptionId};
use crate::plan::{MergeOp, MergePlan};
use crate::reparent::{MoveOutcome, ReparentEngine, TreePair};
use crate::selection::{Category, PropertySourceSelection, SelectionChanged, SourceMap};
use crate::types::{LinkNode, NodeRef, Origin, TreeSnapshot};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Both trees loaded, nothing edited yet.
    Initialized,
    /// At least one move or selection accepted.
    Editing,
    /// Result produced; terminal.
    Finalized,
}

/// States reachable from `from` in one step.
pub fn allowed_transitions(from: SessionState) -> &'static [SessionState] {
    use SessionState::*;
    match from {
        Initialized => &[Editing, Finalized],
        Editing => &[Finalized],
        Finalized => &[],
    }
}

fn validate_transition(from: SessionState, to: SessionState) -> Result<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(MergeError::IllegalTransition { from, to })
    }
}

/// Change notifications delivered to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A subtree changed place. Identity moves are not reported.
    Moved(MoveOutcome),
    SourceSelected(SelectionChanged),
    ReferenceChecked { menu: ReferenceMenu, label: String },
    Finalized,
}

/// What export receives: both trees as the user left them, the per-category
/// sources, and the checked reference geometry if menus were offered.
///
/// The two trees are not combined here. Export reads each category's
/// `LinkData` from the tree named in `sources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub existing: TreeSnapshot,
    pub loaded: TreeSnapshot,
    pub sources: SourceMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceGeometry>,
}

impl MergeResult {
    pub fn tree(&self, origin: Origin) -> &TreeSnapshot {
        match origin {
            Origin::Existing => &self.existing,
            Origin::Loaded => &self.loaded,
        }
    }

    /// The tree that supplies `category`.
    pub fn source_tree(&self, category: Category) -> &TreeSnapshot {
        self.tree(self.sources.get(category))
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

/// Two link trees, one per origin, plus the per-category source choice.
///
/// Moves and selections are accepted until [`finalize`](Self::finalize);
/// after that every mutation fails with `SessionClosed`. Dropping a session
/// abandons its edits.
///
/// # Examples
///
/// ```
/// use linkmerge::v1::*;
///
/// let existing = TreeSnapshot::new(
///     Origin::Existing,
///     "arm",
///     LinkNode::new("base").with_child(LinkNode::new("arm1")),
/// ).unwrap();
/// let loaded = TreeSnapshot::new(
///     Origin::Loaded,
///     "arm.csv",
///     LinkNode::new("base").with_child(LinkNode::new("arm1_renamed")),
/// ).unwrap();
///
/// let mut session = MergeSession::new(existing, loaded).unwrap();
/// session.move_node(
///     &NodeRef::loaded(["base", "arm1_renamed"]),
///     &NodeRef::existing(["base"]),
///     None,
/// ).unwrap();
/// session.select_source(Category::MassInertia, Origin::Loaded).unwrap();
///
/// let result = session.finalize().unwrap();
/// assert_eq!(result.existing.root().children().len(), 2);
/// assert_eq!(result.sources.mass_inertia, Origin::Loaded);
/// assert_eq!(session.state(), SessionState::Finalized);
/// ```
#[derive(Debug)]
pub struct MergeSession {
    trees: TreePair,
    selection: PropertySourceSelection,
    reference: Option<ReferenceMenus>,
    state: SessionState,
    result: Option<MergeResult>,
    observers: Notifier<SessionEvent>,
}

impl MergeSession {
    /// Start a session. The snapshots may come in either order but must
    /// carry different origins.
    pub fn new(a: TreeSnapshot, b: TreeSnapshot) -> Result<Self> {
        let trees = TreePair::new(a, b).inspect_err(|err| {
            tracing::warn!(error = %err, "merge session rejected");
        })?;
        tracing::debug!(
            existing = trees.snapshot(Origin::Existing).source_label(),
            loaded = trees.snapshot(Origin::Loaded).source_label(),
            "merge session opened"
        );
        Ok(Self {
            trees,
            selection: PropertySourceSelection::new(),
            reference: None,
            state: SessionState::Initialized,
            result: None,
            observers: Notifier::default(),
        })
    }

    /// Offer coordinate-system and reference-axis menus for the existing
    /// tree; the first entry of each starts checked.
    pub fn with_reference_geometry<I, J, S, T>(mut self, coordinate_systems: I, axes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.reference = Some(ReferenceMenus::new(coordinate_systems, axes));
        self
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn snapshot(&self, origin: Origin) -> &TreeSnapshot {
        self.trees.snapshot(origin)
    }

    pub fn tree(&self, origin: Origin) -> &LinkNode {
        self.trees.tree(origin)
    }

    pub fn resolve(&self, node: &NodeRef) -> Option<&LinkNode> {
        self.trees.resolve(node)
    }

    pub fn selection(&self) -> &PropertySourceSelection {
        &self.selection
    }

    pub fn reference_menus(&self) -> Option<&ReferenceMenus> {
        self.reference.as_ref()
    }

    pub fn labels(&self) -> SessionLabels {
        SessionLabels::for_snapshots(
            self.trees.snapshot(Origin::Existing),
            self.trees.snapshot(Origin::Loaded),
        )
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ------------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Finalized {
            tracing::warn!("edit attempted on finalized merge session");
            return Err(MergeError::SessionClosed);
        }
        Ok(())
    }

    fn touch(&mut self) -> Result<()> {
        if self.state == SessionState::Initialized {
            validate_transition(self.state, SessionState::Editing)?;
            self.state = SessionState::Editing;
        }
        Ok(())
    }

    /// Move `source` with its subtree under `target_parent`. See
    /// [`ReparentEngine`] for index and failure rules.
    pub fn move_node(
        &mut self,
        source: &NodeRef,
        target_parent: &NodeRef,
        at: Option<usize>,
    ) -> Result<MoveOutcome> {
        self.ensure_open()?;
        let outcome = ReparentEngine::move_node(&mut self.trees, source, target_parent, at)?;
        self.touch()?;
        if !outcome.is_unchanged() {
            self.observers.notify(&SessionEvent::Moved(outcome.clone()));
        }
        Ok(outcome)
    }

    /// Make `origin` the source of `category`. Returns the previous origin.
    pub fn select_source(&mut self, category: Category, origin: Origin) -> Result<Origin> {
        self.ensure_open()?;
        let previous = self.selection.select(category, origin);
        self.touch()?;
        self.observers
            .notify(&SessionEvent::SourceSelected(SelectionChanged {
                category,
                previous,
                current: origin,
            }));
        Ok(previous)
    }

    /// Check an entry of one of the reference-geometry menus.
    pub fn check_reference(&mut self, menu: ReferenceMenu, label: &str) -> Result<()> {
        self.ensure_open()?;
        let menus = self
            .reference
            .as_mut()
            .ok_or_else(|| MergeError::UnknownChoice {
                label: label.to_string(),
            })?;
        menus.menu_mut(menu).check(label)?;
        self.touch()?;
        tracing::debug!(?menu, label, "reference geometry checked");
        self.observers.notify(&SessionEvent::ReferenceChecked {
            menu,
            label: label.to_string(),
        });
        Ok(())
    }

    /// Apply one serialized edit.
    pub fn apply(&mut self, op: &MergeOp) -> Result<()> {
        match op {
            MergeOp::Move { from, to, index } => self.move_node(from, to, *index).map(|_| ()),
            MergeOp::Select { category, origin } => {
                self.select_source(*category, *origin).map(|_| ())
            }
            MergeOp::CheckReference { menu, label } => self.check_reference(*menu, label),
        }
    }

    /// Apply every edit in order, stopping at the first failure. Edits before
    /// the failing one stay applied.
    pub fn apply_plan(&mut self, plan: &MergePlan) -> Result<()> {
        for (index, op) in plan.ops.iter().enumerate() {
            self.apply(op).map_err(|source| MergeError::PlanStep {
                index,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Close the session and return the result. Later calls return the same
    /// result again.
    pub fn finalize(&mut self) -> Result<MergeResult> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }
        validate_transition(self.state, SessionState::Finalized)?;

        let result = MergeResult {
            existing: self.trees.snapshot(Origin::Existing).clone(),
            loaded: self.trees.snapshot(Origin::Loaded).clone(),
            sources: self.selection.snapshot(),
            reference: self.reference.as_ref().map(ReferenceMenus::selection),
        };
        self.state = SessionState::Finalized;
        self.result = Some(result.clone());

        tracing::info!(
            existing_links = result.existing.root().link_count(),
            loaded_links = result.loaded.root().link_count(),
            "merge session finalized"
        );
        self.observers.notify(&SessionEvent::Finalized);
        Ok(result)
    }

    /// Finalize and hand over the result without cloning the trees.
    /// Subscribers see `Finalized` unless [`finalize`](Self::finalize) already
    /// reported it.
    pub fn into_result(mut self) -> Result<MergeResult> {
        if let Some(result) = self.result.take() {
            return Ok(result);
        }
        validate_transition(self.state, SessionState::Finalized)?;
        let sources = self.selection.snapshot();
        let reference = self.reference.as_ref().map(ReferenceMenus::selection);
        tracing::info!(
            existing_links = self.trees.tree(Origin::Existing).link_count(),
            loaded_links = self.trees.tree(Origin::Loaded).link_count(),
            "merge session finalized"
        );
        self.observers.notify(&SessionEvent::Finalized);
        let (existing, loaded) = self.trees.into_parts();
        Ok(MergeResult {
            existing,
            loaded,
            sources,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> MergeSession {
        let existing = TreeSnapshot::new(
            Origin::Existing,
            "3_DOF_ARM",
            LinkNode::new("base_link")
                .with_child(LinkNode::new("link1").with_child(LinkNode::new("link2"))),
        )
        .unwrap();
        let loaded = TreeSnapshot::new(
            Origin::Loaded,
            "3_DOF_ARM.csv",
            LinkNode::new("base_link").with_child(LinkNode::new("link3")),
        )
        .unwrap();
        MergeSession::new(existing, loaded).unwrap()
    }

    #[test]
    fn test_transition_table() {
        assert!(validate_transition(SessionState::Initialized, SessionState::Editing).is_ok());
        assert!(validate_transition(SessionState::Initialized, SessionState::Finalized).is_ok());
        assert!(validate_transition(SessionState::Editing, SessionState::Finalized).is_ok());
        assert!(validate_transition(SessionState::Editing, SessionState::Initialized).is_err());
        assert!(allowed_transitions(SessionState::Finalized).is_empty());
    }

    #[test]
    fn test_same_origin_is_configuration_error() {
        let a = TreeSnapshot::new(Origin::Existing, "a", LinkNode::new("r")).unwrap();
        let b = TreeSnapshot::new(Origin::Existing, "b", LinkNode::new("r")).unwrap();
        assert!(matches!(
            MergeSession::new(a, b),
            Err(MergeError::Configuration(Origin::Existing))
        ));
    }

    #[test]
    fn test_first_edit_enters_editing() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Initialized);
        s.select_source(Category::Visual, Origin::Loaded).unwrap();
        assert_eq!(s.state(), SessionState::Editing);
    }

    #[test]
    fn test_rejected_move_keeps_initialized() {
        let mut s = session();
        let root = NodeRef::existing(["base_link"]);
        assert!(s.move_node(&root, &root, None).is_err());
        assert_eq!(s.state(), SessionState::Initialized);
    }

    #[test]
    fn test_finalized_rejects_edits() {
        let mut s = session();
        s.finalize().unwrap();

        let err = s
            .move_node(
                &NodeRef::loaded(["base_link", "link3"]),
                &NodeRef::existing(["base_link"]),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, MergeError::SessionClosed));
        assert!(matches!(
            s.select_source(Category::Visual, Origin::Loaded),
            Err(MergeError::SessionClosed)
        ));
        assert_eq!(s.selection().get(Category::Visual), Origin::Existing);
        assert_eq!(s.tree(Origin::Loaded).children().len(), 1);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut s = session();
        s.move_node(
            &NodeRef::loaded(["base_link", "link3"]),
            &NodeRef::existing(["base_link", "link1", "link2"]),
            None,
        )
        .unwrap();
        let first = s.finalize().unwrap();
        let second = s.finalize().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_events_are_delivered() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut s = session();
        let sink = Rc::clone(&events);
        s.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        s.move_node(
            &NodeRef::loaded(["base_link", "link3"]),
            &NodeRef::existing(["base_link"]),
            Some(0),
        )
        .unwrap();
        // Identity move: no event.
        s.move_node(
            &NodeRef::existing(["base_link", "link3"]),
            &NodeRef::existing(["base_link"]),
            Some(0),
        )
        .unwrap();
        s.select_source(Category::OtherJoint, Origin::Loaded).unwrap();
        s.finalize().unwrap();
        s.finalize().unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SessionEvent::Moved(MoveOutcome::Moved { index: 0, .. })));
        assert!(matches!(
            events[1],
            SessionEvent::SourceSelected(SelectionChanged {
                category: Category::OtherJoint,
                current: Origin::Loaded,
                ..
            })
        ));
        assert_eq!(events[2], SessionEvent::Finalized);
    }

    #[test]
    fn test_reference_menus() {
        let mut s = session().with_reference_geometry(
            ["Origin_global", "Origin_base"],
            ["Axis_z", "Axis_x"],
        );
        s.check_reference(ReferenceMenu::CoordinateSystem, "Origin_base")
            .unwrap();
        assert!(s.check_reference(ReferenceMenu::Axis, "Axis_q").is_err());

        let result = s.finalize().unwrap();
        assert_eq!(
            result.reference,
            Some(ReferenceGeometry {
                coordinate_system: Some("Origin_base".into()),
                axis: Some("Axis_z".into()),
            })
        );
    }

    #[test]
    fn test_reference_without_menus() {
        let mut s = session();
        assert!(matches!(
            s.check_reference(ReferenceMenu::Axis, "Axis_z"),
            Err(MergeError::UnknownChoice { .. })
        ));
        assert!(s.finalize().unwrap().reference.is_none());
    }

    #[test]
    fn test_apply_plan_reports_failing_index() {
        let mut s = session();
        let plan = MergePlan::new()
            .with_op(MergeOp::Select {
                category: Category::MassInertia,
                origin: Origin::Loaded,
            })
            .with_op(MergeOp::Move {
                from: NodeRef::existing(["base_link", "link1"]),
                to: NodeRef::existing(["base_link", "link1", "link2"]),
                index: None,
            })
            .with_op(MergeOp::Select {
                category: Category::Visual,
                origin: Origin::Loaded,
            });

        match s.apply_plan(&plan).unwrap_err() {
            MergeError::PlanStep { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, MergeError::Cycle { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(s.selection().get(Category::MassInertia), Origin::Loaded);
        assert_eq!(s.selection().get(Category::Visual), Origin::Existing);
    }

    #[test]
    fn test_into_result_notifies_once() {
        let events = Rc::new(RefCell::new(Vec::new()));

        let mut fresh = session();
        let sink = Rc::clone(&events);
        fresh.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        fresh.into_result().unwrap();
        assert_eq!(*events.borrow(), vec![SessionEvent::Finalized]);

        events.borrow_mut().clear();
        let mut done = session();
        let sink = Rc::clone(&events);
        done.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        done.finalize().unwrap();
        done.into_result().unwrap();
        assert_eq!(*events.borrow(), vec![SessionEvent::Finalized]);
    }

    #[test]
    fn test_check_reference_after_finalize_is_closed() {
        let mut s = session().with_reference_geometry(["Origin_global", "Origin_base"], ["Axis_z"]);
        s.finalize().unwrap();
        assert!(matches!(
            s.check_reference(ReferenceMenu::CoordinateSystem, "Origin_base"),
            Err(MergeError::SessionClosed)
        ));
        assert_eq!(
            s.reference_menus().unwrap().coordinate_systems.checked(),
            Some("Origin_global")
        );
    }

    #[test]
    fn test_into_result_matches_finalize() {
        let mut a = session();
        a.select_source(Category::JointKinematics, Origin::Loaded).unwrap();
        let mut b = session();
        b.select_source(Category::JointKinematics, Origin::Loaded).unwrap();

        assert_eq!(a.finalize().unwrap(), b.into_result().unwrap());
    }

    #[test]
    fn test_result_source_tree() {
        let mut s = session();
        s.select_source(Category::Visual, Origin::Loaded).unwrap();
        let result = s.finalize().unwrap();
        assert_eq!(result.source_tree(Category::Visual).source_label(), "3_DOF_ARM.csv");
        assert_eq!(result.source_tree(Category::MassInertia).source_label(), "3_DOF_ARM");
    }

    #[test]
    fn test_result_json_rejects_duplicate_siblings() {
        let mut s = session();
        let json = s.finalize().unwrap().to_json().unwrap();
        assert!(serde_json::from_str::<MergeResult>(&json).is_ok());

        let tampered = json.replacen("\"link3\"", "\"dup\"}, {\"name\": \"dup\"", 1);
        assert!(serde_json::from_str::<MergeResult>(&tampered).is_err());
    }

    #[test]
    fn test_labels_come_from_snapshots() {
        let labels = session().labels();
        assert_eq!(labels.loaded_heading.text, "Configuration from CSV: 3_DOF_ARM.csv");
    }
}
