mod common;

use std::rc::Rc;

use common::{ms, Harness, TestElement};
use serde_json::json;
use vizij_behavior_core::{
    Animatable, AnimatableController, Animation, AnimationRegistry, EndBehavior, Outcome,
    StateSwitcher,
};

struct Stage {
    h: Harness,
    el: Rc<TestElement>,
    registry: Rc<AnimationRegistry>,
    switcher: StateSwitcher,
}

fn stage() -> Stage {
    let h = Harness::new();
    let doc: serde_json::Value =
        vizij_test_fixtures::registries::load("mascot").expect("load mascot registry");
    let registry = Rc::new(AnimationRegistry::from_json(&doc).expect("valid registry"));
    let switcher = StateSwitcher::new(h.host.clone());
    Stage {
        el: TestElement::new("mascot"),
        h,
        registry,
        switcher,
    }
}

impl Stage {
    fn animation(&self, name: &str, duration_ms: u64, soft: bool) -> Animation {
        let c = AnimatableController::new(
            self.h.host.clone(),
            Some(self.el.clone()),
            self.registry.clone(),
        );
        c.set_duration(Some(ms(duration_ms)));
        Animation::new(c, "mascot", name, soft)
    }

    fn loaded_from(&self, prefix: &str) -> usize {
        self.el
            .loaded()
            .iter()
            .filter(|image| image.starts_with(prefix))
            .count()
    }
}

#[test]
fn only_the_latest_switch_takes_effect() {
    let mut s = stage();
    s.switcher.add_state("A", s.animation("idle", 400, false));
    s.switcher.add_state("B", s.animation("wave", 200, false));

    let a = s.h.spawn(s.switcher.switch_to("A"));
    let b = s.h.spawn(s.switcher.switch_to("B"));
    s.h.run();

    assert_eq!(a.get(), Some(Ok(Outcome::Done(false))));
    assert!(b.is_pending());
    assert_eq!(s.switcher.current_state().as_deref(), Some("B"));
    assert_eq!(s.loaded_from("mascot/idle"), 0);
    assert_eq!(s.el.loaded(), vec!["mascot/wave.png"]);

    s.h.ticks(2, 100);
    assert_eq!(b.get(), Some(Ok(Outcome::Done(true))));
}

#[test]
fn superseded_switch_never_starts_its_state() {
    let mut s = stage();
    s.switcher.add_state("A", s.animation("idle", 400, false));
    s.switcher.add_state("B", s.animation("wave", 200, false));
    s.switcher.add_state("C", s.animation("idle", 400, false));

    let a = s.h.spawn(s.switcher.switch_to("A"));
    s.h.run();
    assert!(s.switcher.is_working());

    let b = s.h.spawn(s.switcher.switch_to("B"));
    let c = s.h.spawn(s.switcher.switch_to("C"));
    s.h.run();

    assert_eq!(a.get(), Some(Ok(Outcome::Done(false))));
    assert_eq!(b.get(), Some(Ok(Outcome::Done(false))));
    assert!(c.is_pending());
    assert_eq!(s.loaded_from("mascot/wave"), 0);
    assert_eq!(s.switcher.current_state().as_deref(), Some("C"));
    assert_eq!(s.switcher.target_state().as_deref(), Some("C"));
}

#[test]
fn finished_state_chains_to_its_follow_up() {
    let mut s = stage();
    let wave = s.animation("wave", 200, false);
    wave.controller().set_end_behavior(EndBehavior::Custom {
        hide: false,
        switch_to: Some("idle".into()),
    });
    s.switcher.add_state("wave", wave);
    s.switcher.add_state("idle", s.animation("idle", 400, false));

    let first = s.h.spawn(s.switcher.switch_to("wave"));
    s.h.run();
    s.h.tick(100);
    assert!(first.is_pending());
    s.h.tick(100);

    assert_eq!(first.get(), Some(Ok(Outcome::Done(true))));
    assert_eq!(s.switcher.current_state().as_deref(), Some("idle"));
    assert!(s.switcher.is_working());
    assert_eq!(s.el.last_loaded().as_deref(), Some("mascot/idle-0.png"));
}

#[test]
fn chained_follow_up_is_dropped_once_superseded() {
    let mut s = stage();
    let wave = s.animation("wave", 200, false);
    wave.controller().set_end_behavior(EndBehavior::Custom {
        hide: false,
        switch_to: Some("idle".into()),
    });
    s.switcher.add_state("wave", wave);
    s.switcher.add_state("idle", s.animation("idle", 400, false));
    s.switcher.add_state("rest", s.animation("empty", 400, false));

    let first = s.h.spawn(s.switcher.switch_to("wave"));
    s.h.run();
    let rest = s.h.spawn(s.switcher.switch_to("rest"));
    s.h.run();

    assert_eq!(first.get(), Some(Ok(Outcome::Done(false))));
    assert_eq!(rest.get(), Some(Ok(Outcome::Done(true))));
    assert_eq!(s.switcher.current_state().as_deref(), Some("rest"));
    assert_eq!(s.loaded_from("mascot/idle"), 0);
}

#[test]
fn soft_states_finish_their_cycle_before_switching() {
    let mut s = stage();
    let looping = s.animation("idle", 400, true);
    looping.controller().set_repetition(Some(&json!(true))).unwrap();
    s.switcher.add_state("idle", looping);
    s.switcher.add_state("wave", s.animation("wave", 200, false));

    let idle = s.h.spawn(s.switcher.switch_to("idle"));
    s.h.run();
    s.h.tick(100);

    let wave = s.h.spawn(s.switcher.switch_to("wave"));
    s.h.run();
    s.h.ticks(2, 100);
    assert_eq!(s.loaded_from("mascot/wave"), 0);
    assert!(wave.is_pending());

    s.h.tick(100);
    assert_eq!(idle.get(), Some(Ok(Outcome::Done(true))));
    assert_eq!(s.loaded_from("mascot/wave"), 1);
    assert_eq!(s.loaded_from("mascot/idle-0"), 1);
}

#[test]
fn stop_cancels_in_flight_switches() {
    let mut s = stage();
    s.switcher.add_state("A", s.animation("idle", 400, false));
    let a = s.h.spawn(s.switcher.switch_to("A"));
    let stopped = s.h.spawn(s.switcher.stop());
    s.h.run();
    assert_eq!(stopped.get(), Some(Ok(Outcome::Done(true))));
    assert_eq!(a.get(), Some(Ok(Outcome::Done(false))));
    assert_eq!(s.switcher.current_state(), None);
    assert!(s.el.loaded().is_empty());
}

#[test]
fn returning_to_a_state_still_settling_restarts_it() {
    let mut s = stage();
    let looping = s.animation("idle", 400, true);
    looping.controller().set_repetition(Some(&json!(true))).unwrap();
    s.switcher.add_state("A", looping);
    s.switcher.add_state("B", s.animation("wave", 200, false));

    let first = s.h.spawn(s.switcher.switch_to("A"));
    s.h.run();
    s.h.tick(100);

    let b = s.h.spawn(s.switcher.switch_to("B"));
    let back = s.h.spawn(s.switcher.switch_to("A"));
    s.h.run();
    assert!(back.is_pending());

    s.h.ticks(3, 100);
    assert_eq!(first.get(), Some(Ok(Outcome::Done(true))));
    assert_eq!(b.get(), Some(Ok(Outcome::Done(false))));
    assert_eq!(s.switcher.current_state().as_deref(), Some("A"));
    assert!(s.switcher.is_working());
    assert_eq!(s.loaded_from("mascot/idle-0"), 2);
    assert_eq!(s.loaded_from("mascot/wave"), 0);

    s.h.ticks(5, 100);
    assert!(s.switcher.is_working());
    assert!(back.is_pending());
}
