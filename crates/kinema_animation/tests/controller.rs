//! Integration tests for controller timing and lifecycle events
//!
//! These tests drive controllers through the animator the way a host does:
//! create, tick with frame deltas, and observe progress and events.

use kinema_animation::{Animator, Controller, ControllerEvent, ControllerOptions, PlayState};
use kinema_core::EventLog;

fn animator() -> Animator {
    Animator::with_defaults(ControllerOptions::new().ease("linear"))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_total_duration_formula() {
    let mut anim = animator();
    for (duration, repeat, iteration_delay) in [
        (1.0, 0, 0.0),
        (0.5, 3, 0.25),
        (2.0, 1, 1.0),
        (0.0, 4, 0.5),
    ] {
        let id = anim.create(
            ControllerOptions::new()
                .delay(0.3)
                .duration(duration)
                .repeat(repeat)
                .iteration_delay(iteration_delay),
        );
        let expected = (repeat as f64 + 1.0) * duration + repeat as f64 * iteration_delay;
        let total = anim.controller(id).map_or(f64::NAN, Controller::total_duration);
        assert!(close(total, expected), "{duration} x {repeat}: {total} != {expected}");
    }
}

#[test]
fn test_progress_is_exact_at_ends_and_monotonic() {
    let mut anim = animator();
    let id = anim.create(ControllerOptions::new().duration(1.5).paused(true));
    let controller = anim.controller(id).expect("controller");

    assert_eq!(controller.progress_at(0.0), 0.0);
    assert_eq!(controller.progress_at(1.0), 1.0);
    let mut last = 0.0;
    for step in 1..=100 {
        let progress = controller.progress_at(step as f64 / 100.0);
        assert!(progress >= last);
        last = progress;
    }
}

#[test]
fn test_alternation_round_trip_keeps_pose() {
    let mut anim = animator();
    let id = anim.create(ControllerOptions::new().duration(1.0).repeat(2).paused(true));
    anim.seek(id, 1.25);
    let before = anim.controller(id).map_or(f64::NAN, Controller::eased_progress);
    assert!(close(before, 0.25));

    anim.set_alternate(id, true, true);
    let during = anim.controller(id).map_or(f64::NAN, Controller::eased_progress);
    assert!(close(during, before));

    anim.set_alternate(id, false, true);
    let after = anim.controller(id).map_or(f64::NAN, Controller::eased_progress);
    assert!(close(after, before));
}

#[test]
fn test_half_second_scenario() {
    let mut anim = animator();
    let log = EventLog::new();
    anim.set_observer(log.clone());
    let id = anim.create(ControllerOptions::new().duration(1.0).ease("powerInOut(2)"));

    anim.tick(0.25);
    anim.tick(0.25);
    let progress = anim.controller(id).map_or(f64::NAN, Controller::progress);
    assert!(close(progress, 0.5));
    assert_eq!(log.count(id, ControllerEvent::Start), 1);
    assert_eq!(log.count(id, ControllerEvent::Complete), 0);

    anim.tick(0.3);
    anim.tick(0.3);
    anim.tick(0.3);
    assert_eq!(anim.play_state(id), Some(PlayState::Completed));
    assert_eq!(log.count(id, ControllerEvent::Start), 1);
    assert_eq!(log.count(id, ControllerEvent::Complete), 1);
    assert!(!anim.has_active());
}

#[test]
fn test_delay_carries_into_progress() {
    let mut anim = animator();
    let id = anim.create(ControllerOptions::new().delay(0.5).duration(1.0));

    anim.tick(0.25);
    assert_eq!(anim.play_state(id), Some(PlayState::Delaying));
    assert_eq!(anim.controller(id).map(Controller::total_progress), Some(0.0));

    anim.tick(0.5);
    let progress = anim.controller(id).map_or(f64::NAN, Controller::progress);
    assert!(close(progress, 0.25));
    assert_eq!(anim.play_state(id), Some(PlayState::Active));
}

#[test]
fn test_repeat_with_iteration_delay() {
    let mut anim = animator();
    let log = EventLog::new();
    anim.set_observer(log.clone());
    let id = anim.create(
        ControllerOptions::new()
            .duration(1.0)
            .repeat(2)
            .iteration_delay(0.5),
    );

    anim.tick(1.25);
    let controller = anim.controller(id).expect("controller");
    assert_eq!(controller.iteration(), 0);
    assert_eq!(controller.progress(), 1.0);

    anim.tick(0.5);
    let controller = anim.controller(id).expect("controller");
    assert_eq!(controller.iteration(), 1);
    assert!(close(controller.progress(), 0.25));
    assert_eq!(log.count(id, ControllerEvent::Repeat), 1);
}

#[test]
fn test_alternating_loop_ends_on_start_pose() {
    let mut anim = animator();
    let id = anim.create(ControllerOptions::new().duration(1.0).repeat(1).alternate(true));
    anim.tick(1.5);
    let controller = anim.controller(id).expect("controller");
    assert!(controller.is_alternating());
    assert!(close(controller.progress(), 0.5));

    anim.tick(1.0);
    let controller = anim.controller(id).expect("controller");
    assert_eq!(controller.total_progress(), 1.0);
    assert_eq!(controller.progress(), 0.0);
}

#[test]
fn test_time_scale_speeds_up_ticks() {
    let mut anim = animator();
    let id = anim.create(ControllerOptions::new().duration(2.0).time_scale(2.0));
    anim.tick(0.5);
    let progress = anim.controller(id).map_or(f64::NAN, Controller::progress);
    assert!(close(progress, 0.5));
}

#[test]
fn test_reverse_fires_reverse_events() {
    let mut anim = animator();
    let log = EventLog::new();
    anim.set_observer(log.clone());
    let id = anim.create(ControllerOptions::new().duration(1.0));

    anim.tick(2.0);
    assert_eq!(anim.play_state(id), Some(PlayState::Completed));
    anim.reverse(id);
    anim.tick(0.5);
    anim.tick(0.75);

    assert_eq!(log.count(id, ControllerEvent::ReverseStart), 1);
    assert_eq!(log.count(id, ControllerEvent::ReverseComplete), 1);
    assert_eq!(anim.play_state(id), Some(PlayState::ReverseCompleted));
}
