//! Integration tests for tweens, stagger and keyframes
//!
//! Targets are in-memory, so every value a tween writes can be read back.

use kinema_animation::{
    Animator, Controller, ControllerOptions, Keyframes, StaggerFrom, StaggerOptions,
};
use kinema_core::TargetId;
use kinema_style::testing::MemoryTarget;
use kinema_style::{property_map, PropertyMap, PropertyValue};

fn animator() -> Animator {
    Animator::with_defaults(ControllerOptions::new().ease("linear"))
}

fn read(anim: &Animator, target: TargetId, property: &str) -> Option<String> {
    anim.target(target).and_then(|t| t.read_value(property))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_from_to_pre_renders_start() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new().with_value("width", "10px"));
    anim.from_to(
        target,
        property_map([("width", "100px")]),
        property_map([("width", "200px")]),
        ControllerOptions::new().duration(2.0),
    );
    assert_eq!(read(&anim, target, "width").as_deref(), Some("100px"));

    anim.tick(1.0);
    assert_eq!(read(&anim, target, "width").as_deref(), Some("150px"));
}

#[test]
fn test_relative_values() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new().with_value("width", "100px"));
    anim.to(target, property_map([("width", "+=50px")]), ControllerOptions::new());

    anim.tick(1.0);
    assert_eq!(read(&anim, target, "width").as_deref(), Some("150px"));
}

#[test]
fn test_transform_channels_share_a_fragment() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new());
    anim.to(target, property_map([("x", 100.0)]), ControllerOptions::new());
    anim.to(target, property_map([("rotate", 90.0)]), ControllerOptions::new());

    anim.tick(1.0);
    let transform = anim.fragment(target).and_then(|f| f.transform_string());
    let transform = transform.expect("transform written");
    assert!(transform.contains("translate3d(100px"), "{transform}");
    assert!(transform.contains("rotate(90deg)"), "{transform}");
}

#[test]
fn test_stagger_offsets_children() {
    let mut anim = animator();
    let targets: Vec<TargetId> = (0..3)
        .map(|_| anim.register_named(".item", MemoryTarget::new().with_value("opacity", "1")))
        .collect();
    let tween = anim.to(
        ".item",
        property_map([("opacity", 0.0)]),
        ControllerOptions::new().stagger(StaggerOptions::each(0.5)),
    );

    let inner = anim.tween_state(tween).and_then(|t| t.inner()).expect("stagger timeline");
    assert_eq!(anim.children(inner).len(), 3);
    assert!(close(anim.controller(tween).map_or(0.0, Controller::duration), 2.0));
    assert!(anim.tween_state(tween).is_some_and(|t| t.target().is_none()));

    anim.tick(1.0);
    assert_eq!(read(&anim, targets[0], "opacity").as_deref(), Some("0"));
    assert_eq!(read(&anim, targets[1], "opacity").as_deref(), Some("0.5"));
    assert_eq!(read(&anim, targets[2], "opacity").as_deref(), Some("1"));
}

#[test]
fn test_stagger_from_end() {
    let mut anim = animator();
    let targets: Vec<TargetId> = (0..3)
        .map(|_| anim.register_named("dot", MemoryTarget::new()))
        .collect();
    let tween = anim.to(
        "dot",
        property_map([("x", 10.0)]),
        ControllerOptions::new().stagger(StaggerOptions::each(0.25).origin(StaggerFrom::End)),
    );
    let inner = anim.tween_state(tween).and_then(|t| t.inner()).expect("stagger timeline");
    let starts: Vec<f64> = anim
        .children(inner)
        .into_iter()
        .map(|child| anim.child_span(inner, child).map_or(f64::NAN, |(start, _)| start))
        .collect();
    assert_eq!(starts, vec![0.5, 0.25, 0.0]);
    assert_eq!(targets.len(), 3);
}

#[test]
fn test_value_keyframes() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new().with_value("opacity", "1"));
    let keyframes = Keyframes::values([(
        "opacity",
        vec![PropertyValue::from(1.0), 0.0.into(), 0.5.into()],
    )]);
    let tween = anim.to(
        target,
        PropertyMap::new(),
        ControllerOptions::new().duration(2.0).keyframes(keyframes),
    );
    let inner = anim.tween_state(tween).and_then(|t| t.inner()).expect("keyframe timeline");
    assert_eq!(anim.children(inner).len(), 2);

    anim.tick(0.5);
    assert_eq!(read(&anim, target, "opacity").as_deref(), Some("0.5"));

    anim.tick(1.0);
    assert_eq!(read(&anim, target, "opacity").as_deref(), Some("0.25"));
}

#[test]
fn test_percentage_keyframes_seed_from_tween() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new().with_value("opacity", "1"));
    let keyframes = Keyframes::percentages([(50.0, property_map([("opacity", 0.2)]))]);
    let tween = anim.to(
        target,
        property_map([("opacity", 0.0)]),
        ControllerOptions::new().duration(1.0).keyframes(keyframes),
    );
    let inner = anim.tween_state(tween).and_then(|t| t.inner()).expect("keyframe timeline");
    assert_eq!(anim.children(inner).len(), 2);

    anim.tick(0.75);
    assert_eq!(read(&anim, target, "opacity").as_deref(), Some("0.1"));
}

#[test]
fn test_pause_and_resume_tween() {
    let mut anim = animator();
    let target = anim.register_target(MemoryTarget::new().with_value("opacity", "1"));
    let tween = anim.to(target, property_map([("opacity", 0.0)]), ControllerOptions::new());

    anim.tick(0.25);
    anim.pause(tween);
    anim.tick(0.5);
    assert_eq!(read(&anim, target, "opacity").as_deref(), Some("0.75"));

    anim.resume(tween);
    anim.tick(0.25);
    assert_eq!(read(&anim, target, "opacity").as_deref(), Some("0.5"));
}
