// Host-side tests for resource readiness aggregation and key bindings.

#![allow(dead_code)]
mod constants {
    include!("../src/core/constants.rs");
}
mod controls {
    include!("../src/core/controls.rs");
}
mod passes {
    include!("../src/core/passes.rs");
}
mod readiness {
    include!("../src/core/readiness.rs");
}

use controls::*;
use passes::PassId;
use readiness::*;

fn declared(ids: &[&str]) -> Readiness {
    let mut r = Readiness::new(100.0, 10.0);
    for id in ids {
        r.declare(id);
    }
    r
}

#[test]
fn waits_until_every_resource_settles() {
    let mut r = declared(&["audio", "captions", "prop_0"]);
    assert_eq!(r.poll(101.0), ReadinessState::Pending);

    r.resolve("audio");
    r.fallback("captions", "404");
    assert!(r.is_ready("captions"));
    assert!(!r.all_ready());
    assert_eq!(r.pending(), vec!["prop_0".to_string()]);

    r.resolve("prop_0");
    assert_eq!(r.poll(102.0), ReadinessState::Ready);
}

#[test]
fn deadline_names_what_is_missing() {
    let mut r = declared(&["audio", "prop_0", "prop_1"]);
    r.resolve("prop_0");
    assert_eq!(
        r.poll(110.0),
        ReadinessState::TimedOut {
            missing: vec!["audio".into(), "prop_1".into()]
        }
    );
}

#[test]
fn fallback_keeps_its_reason() {
    let mut r = declared(&["audio"]);
    r.fallback("audio", "decode error");
    assert_eq!(
        r.state("audio"),
        Some(&ResourceState::Fallback("decode error".into()))
    );
    assert_eq!(r.state("unknown"), None);
}

#[test]
fn redeclaring_keeps_settled_state() {
    let mut r = declared(&["audio"]);
    r.resolve("audio");
    r.declare("audio");
    assert!(r.is_ready("audio"));
}

#[test]
fn nothing_declared_is_ready() {
    assert_eq!(Readiness::new(0.0, 0.0).poll(0.0), ReadinessState::Ready);
}

#[test]
fn keys_map_to_actions() {
    assert_eq!(action_for_key(" "), Some(KeyAction::TogglePlayback));
    assert_eq!(action_for_key("R"), Some(KeyAction::Repopulate));
    assert_eq!(action_for_key("d"), Some(KeyAction::ProbeDepth));
    assert_eq!(action_for_key("h"), Some(KeyAction::ToggleOverlay));
    assert_eq!(action_for_key("q"), None);
}

#[test]
fn bracket_keys_nudge_in_opposite_directions() {
    let pairs = [("[", "]"), (";", "'"), ("-", "=")];
    for (down, up) in pairs {
        match (action_for_key(down), action_for_key(up)) {
            (
                Some(KeyAction::Nudge { pass: p0, name: n0, delta: d0 }),
                Some(KeyAction::Nudge { pass: p1, name: n1, delta: d1 }),
            ) => {
                assert_eq!((p0, n0), (p1, n1));
                assert!(d0 < 0.0 && d1 > 0.0);
                assert_eq!(d0, -d1);
            }
            other => panic!("{} / {} not nudges: {:?}", down, up, other),
        }
    }
    assert!(matches!(
        action_for_key("]"),
        Some(KeyAction::Nudge { pass: PassId::Bloom, .. })
    ));
}
