mod common;

use std::rc::Rc;

use common::{ms, BehaviorFixture, Harness, TestElement};
use serde_json::json;
use vizij_behavior_core::{
    AnimatableController, Animation, AnimationRegistry, BehaviorError, BehaviorGroup, Outcome,
};

struct Loaded {
    h: Harness,
    root: Rc<TestElement>,
    group: BehaviorGroup,
}

fn load_face() -> Loaded {
    let h = Harness::new();
    let fixture: BehaviorFixture =
        vizij_test_fixtures::behaviors::load("face").expect("load face behavior");
    let root = TestElement::from_scene(&fixture.scene);
    let mut group = BehaviorGroup::new(
        h.host.clone(),
        Rc::new(AnimationRegistry::new()),
        fixture.registry,
    );
    group
        .load_json(root.as_ref(), &fixture.descriptors)
        .expect("face descriptors load");
    Loaded { h, root, group }
}

#[test]
fn loading_registers_frames_for_every_animation() {
    let l = load_face();
    assert_eq!(l.group.len(), 2);
    let registry = l.group.registry();
    assert_eq!(registry.animation_names("face"), vec!["blink", "smile", "talk"]);
}

#[test]
fn start_joins_every_member() {
    let mut l = load_face();
    let eyes = l.root.named("eyes").unwrap();
    let mouth = l.root.named("mouth").unwrap();

    let started = l.h.spawn(l.group.start("happy"));
    l.h.run();
    assert_eq!(eyes.last_loaded().as_deref(), Some("eyes/open.png"));
    assert_eq!(mouth.last_loaded().as_deref(), Some("mouth/smile-0.png"));

    l.h.ticks(2, 100);
    // The mouth chained from "happy" into "talking"; the eyes are mid-blink.
    assert_eq!(mouth.last_loaded().as_deref(), Some("mouth/talk.png"));
    assert!(started.is_pending());

    l.h.ticks(4, 100);
    assert!(started.is_pending());
    l.h.tick(100);
    assert_eq!(
        started.get(),
        Some(Ok(vec![Outcome::Done(true), Outcome::Done(true)]))
    );
    assert!(!eyes.is_visible());
    assert!(mouth.is_visible());
}

#[test]
fn stop_waits_for_soft_members() {
    let mut l = load_face();
    let _started = l.h.spawn(l.group.start("talking"));
    l.h.run();
    l.h.tick(100);

    let stopped = l.h.spawn(l.group.stop());
    l.h.run();
    assert!(stopped.is_pending());

    l.h.tick(100);
    assert_eq!(
        stopped.get(),
        Some(Ok(vec![Outcome::Done(false), Outcome::Done(true)]))
    );
}

#[test]
fn three_members_resolve_together() {
    let mut h = Harness::new();
    let doc: serde_json::Value =
        vizij_test_fixtures::registries::load("mascot").expect("load mascot registry");
    let registry = Rc::new(AnimationRegistry::from_json(&doc).unwrap());
    let mut group = BehaviorGroup::new(h.host.clone(), registry.clone(), "mascot");
    for (name, duration) in [("idle", 400), ("wave", 200), ("idle", 600)] {
        let el = TestElement::new(name);
        let c = AnimatableController::new(h.host.clone(), Some(el), registry.clone());
        c.set_duration(Some(ms(duration)));
        group.push(Animation::new(c, "mascot", name, false));
    }

    let started = h.spawn(group.start("anything"));
    h.run();
    h.ticks(5, 100);
    assert!(started.is_pending());
    h.tick(100);
    assert_eq!(started.get(), Some(Ok(vec![Outcome::Done(true); 3])));
}

#[test]
fn torn_down_members_are_pruned() {
    let mut l = load_face();
    l.group.tear_down();
    assert!(l.group.is_empty());
    let started = l.h.spawn(l.group.start("happy"));
    l.h.run();
    assert_eq!(started.get(), Some(Ok(Vec::new())));
}

#[test]
fn missing_required_fields_fail_the_load() {
    let h = Harness::new();
    let fixture: BehaviorFixture = vizij_test_fixtures::behaviors::load("broken-missing-duration")
        .expect("load broken fixture");
    let root = TestElement::from_scene(&fixture.scene);
    let mut group =
        BehaviorGroup::new(h.host.clone(), Rc::new(AnimationRegistry::new()), fixture.registry);
    let err = group
        .load_json(root.as_ref(), &fixture.descriptors)
        .unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidDescriptor { .. }));
}

#[test]
fn null_entries_fail_and_non_arrays_load_nothing() {
    let h = Harness::new();
    let root = TestElement::new("root");
    let mut group = BehaviorGroup::new(h.host.clone(), Rc::new(AnimationRegistry::new()), "face");

    let err = group.load_json(root.as_ref(), &json!([null])).unwrap_err();
    assert_eq!(err, BehaviorError::descriptor("No descriptor to load"));

    group
        .load_json(root.as_ref(), &json!({"name": "blink"}))
        .unwrap();
    assert!(group.is_empty());
}

#[test]
fn groups_without_a_registry_name_load_nothing() {
    let h = Harness::new();
    let fixture: BehaviorFixture =
        vizij_test_fixtures::behaviors::load("face").expect("load face behavior");
    let root = TestElement::from_scene(&fixture.scene);
    let mut group = BehaviorGroup::new(h.host.clone(), Rc::new(AnimationRegistry::new()), "");
    group
        .load_json(root.as_ref(), &fixture.descriptors)
        .unwrap();
    assert!(group.is_empty());
}
