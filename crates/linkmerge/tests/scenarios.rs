use linkmerge::v1::*;
use serde_json::json;

fn arm(origin: Origin, label: &str, child: &str) -> TreeSnapshot {
    TreeSnapshot::new(
        origin,
        label,
        LinkNode::new("base").with_child(
            LinkNode::new(child).with_link(LinkData::new(json!({ "mass": 1.5 }))),
        ),
    )
    .unwrap()
}

fn child_names(node: &LinkNode) -> Vec<&str> {
    node.children().iter().map(|c| c.name()).collect()
}

#[test]
fn test_renamed_link_moves_beside_original() {
    let mut session = MergeSession::new(
        arm(Origin::Existing, "arm", "arm1"),
        arm(Origin::Loaded, "arm.csv", "arm1_renamed"),
    )
    .unwrap();

    let outcome = session
        .move_node(
            &NodeRef::loaded(["base", "arm1_renamed"]),
            &NodeRef::existing(["base"]),
            None,
        )
        .unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            from: NodeRef::loaded(["base", "arm1_renamed"]),
            to: NodeRef::existing(["base", "arm1_renamed"]),
            index: 1,
        }
    );

    // Moving the same link again is a no-op, not a name clash with itself.
    let again = session
        .move_node(
            &NodeRef::existing(["base", "arm1_renamed"]),
            &NodeRef::existing(["base"]),
            None,
        )
        .unwrap();
    assert!(again.is_unchanged());

    let result = session.finalize().unwrap();
    assert_eq!(child_names(result.existing.root()), ["arm1", "arm1_renamed"]);
    assert!(result.loaded.root().children().is_empty());
    let moved = result.existing.root().child("arm1_renamed").unwrap();
    assert_eq!(moved.link().as_value()["mass"], 1.5);
}

#[test]
fn test_same_name_cannot_join_siblings() {
    let mut session = MergeSession::new(
        arm(Origin::Existing, "arm", "arm1"),
        arm(Origin::Loaded, "arm.csv", "arm1"),
    )
    .unwrap();

    let err = session
        .move_node(
            &NodeRef::loaded(["base", "arm1"]),
            &NodeRef::existing(["base"]),
            Some(0),
        )
        .unwrap_err();
    assert!(matches!(err, MergeError::DuplicateName { ref name, .. } if name == "arm1"));
    assert!(err.is_recoverable());
    assert_eq!(session.state(), SessionState::Initialized);
    assert_eq!(child_names(session.tree(Origin::Loaded)), ["arm1"]);
    assert_eq!(child_names(session.tree(Origin::Existing)), ["arm1"]);
}

#[test]
fn test_second_link_with_moved_name_is_rejected() {
    let loaded = TreeSnapshot::new(
        Origin::Loaded,
        "arm.csv",
        LinkNode::new("base")
            .with_child(LinkNode::new("arm1_renamed"))
            .with_child(LinkNode::new("spare").with_child(LinkNode::new("arm1_renamed"))),
    )
    .unwrap();
    let mut session =
        MergeSession::new(arm(Origin::Existing, "arm", "arm1"), loaded).unwrap();
    let target = NodeRef::existing(["base"]);

    session
        .move_node(&NodeRef::loaded(["base", "arm1_renamed"]), &target, None)
        .unwrap();
    let before = (
        session.snapshot(Origin::Existing).clone(),
        session.snapshot(Origin::Loaded).clone(),
    );

    let err = session
        .move_node(
            &NodeRef::loaded(["base", "spare", "arm1_renamed"]),
            &target,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, MergeError::DuplicateName { .. }));
    assert_eq!(session.snapshot(Origin::Existing), &before.0);
    assert_eq!(session.snapshot(Origin::Loaded), &before.1);
}

#[test]
fn test_switch_mass_back_to_existing() {
    let mut session = MergeSession::new(
        arm(Origin::Loaded, "arm.csv", "arm1"),
        arm(Origin::Existing, "arm", "arm1"),
    )
    .unwrap();

    assert_eq!(
        session
            .select_source(Category::MassInertia, Origin::Loaded)
            .unwrap(),
        Origin::Existing
    );
    assert_eq!(
        session
            .select_source(Category::MassInertia, Origin::Existing)
            .unwrap(),
        Origin::Loaded
    );

    let result = session.finalize().unwrap();
    assert_eq!(result.sources, SourceMap::default());
    assert_eq!(result.source_tree(Category::MassInertia).source_label(), "arm");
}

#[test]
fn test_round_trip_without_edits() {
    let existing = arm(Origin::Existing, "arm", "arm1");
    let loaded = arm(Origin::Loaded, "arm.csv", "arm2");
    let mut session = MergeSession::new(existing.clone(), loaded.clone()).unwrap();

    let result = session.finalize().unwrap();
    assert_eq!(result.existing, existing);
    assert_eq!(result.loaded, loaded);
    assert_eq!(result.sources, SourceMap::uniform(Origin::Existing));
    assert!(result.reference.is_none());

    let again = TreeSnapshot::from_json(&result.existing.to_json().unwrap()).unwrap();
    assert_eq!(again, existing);
}

#[test]
fn test_move_lands_at_requested_index() {
    let existing = TreeSnapshot::new(
        Origin::Existing,
        "rover",
        LinkNode::new("chassis")
            .with_child(LinkNode::new("left_wheel"))
            .with_child(LinkNode::new("right_wheel"))
            .with_child(LinkNode::new("mast").with_child(LinkNode::new("camera"))),
    )
    .unwrap();
    let loaded = TreeSnapshot::new(
        Origin::Loaded,
        "rover.csv",
        LinkNode::new("chassis").with_child(LinkNode::new("lidar")),
    )
    .unwrap();
    let mut session = MergeSession::new(existing, loaded).unwrap();

    let source = NodeRef::loaded(["chassis", "lidar"]);
    let target = NodeRef::existing(["chassis"]);
    let outcome = session.move_node(&source, &target, Some(1)).unwrap();

    let MoveOutcome::Moved { to, index, .. } = outcome else {
        panic!("expected a move, got {outcome:?}");
    };
    assert_eq!(to.path.parent(), Some(target.path.clone()));
    let parent = session.resolve(&target).unwrap();
    assert_eq!(parent.children()[index].name(), "lidar");
    assert_eq!(
        child_names(parent),
        ["left_wheel", "lidar", "right_wheel", "mast"]
    );

    // Whole subtree travels with its root.
    session
        .move_node(
            &NodeRef::existing(["chassis", "mast"]),
            &NodeRef::existing(["chassis", "lidar"]),
            None,
        )
        .unwrap();
    let camera = NodeRef::existing(["chassis", "lidar", "mast", "camera"]);
    assert!(session.resolve(&camera).is_some());
    assert_eq!(session.tree(Origin::Existing).link_count(), 6);
}

#[test]
fn test_cycle_leaves_trees_untouched() {
    let mut session = MergeSession::new(
        arm(Origin::Existing, "arm", "arm1"),
        arm(Origin::Loaded, "arm.csv", "arm2"),
    )
    .unwrap();
    let before = session.snapshot(Origin::Existing).clone();

    let base = NodeRef::existing(["base"]);
    let arm1 = NodeRef::existing(["base", "arm1"]);
    assert!(matches!(
        session.move_node(&base, &arm1, None),
        Err(MergeError::Cycle { .. })
    ));
    assert!(matches!(
        session.move_node(&arm1, &arm1, None),
        Err(MergeError::Cycle { .. })
    ));
    assert_eq!(session.snapshot(Origin::Existing), &before);
}

#[test]
fn test_finalized_session_stays_closed() {
    let mut session = MergeSession::new(
        arm(Origin::Existing, "arm", "arm1"),
        arm(Origin::Loaded, "arm.csv", "arm2"),
    )
    .unwrap();
    session
        .select_source(Category::Visual, Origin::Loaded)
        .unwrap();
    let first = session.finalize().unwrap();

    let err = session
        .select_source(Category::Visual, Origin::Existing)
        .unwrap_err();
    assert!(matches!(err, MergeError::SessionClosed));
    assert_eq!(session.finalize().unwrap(), first);
    assert_eq!(first.sources.visual, Origin::Loaded);
}

#[test]
fn test_replay_plan_from_json() {
    let mut session = MergeSession::new(
        arm(Origin::Existing, "arm", "arm1"),
        arm(Origin::Loaded, "arm.csv", "gripper"),
    )
    .unwrap()
    .with_reference_geometry(["Origin_global", "Origin_tool"], ["Axis_z"]);

    let plan = MergePlan::from_json(
        r#"{"ops": [
            {"op": "move", "from": {"tree": "loaded", "path": ["base", "gripper"]},
             "to": {"tree": "existing", "path": ["base", "arm1"]}},
            {"op": "select", "category": "visual", "origin": "loaded"},
            {"op": "check_reference", "menu": "coordinate_system", "label": "Origin_tool"}
        ]}"#,
    )
    .unwrap();
    session.apply_plan(&plan).unwrap();

    let result = session.finalize().unwrap();
    let gripper = LinkPath::from_names(["base", "arm1", "gripper"]);
    assert!(result.existing.root().get(&gripper).is_some());
    assert_eq!(result.sources.visual, Origin::Loaded);
    let reference = result.reference.unwrap();
    assert_eq!(reference.coordinate_system.as_deref(), Some("Origin_tool"));
    assert_eq!(reference.axis.as_deref(), Some("Axis_z"));
}
