//! Process-wide defaults and configuration files
//!
//! Global defaults are shared by every test in this binary, so all of them
//! live in one test.

use std::path::PathBuf;

use kinema_animation::{
    reset_global_defaults, set_global_defaults, Animator, AnimatorConfig, Controller,
    ControllerOptions, Easing,
};

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("kinema-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn test_defaults_layering() {
    reset_global_defaults();
    set_global_defaults(&ControllerOptions::new().duration(2.0).ease("linear"));
    set_global_defaults(&ControllerOptions::new().repeat(1));

    // snapshot at construction
    let mut anim = Animator::new();
    reset_global_defaults();

    let id = anim.create(ControllerOptions::new());
    let controller = anim.controller(id).expect("controller");
    assert_eq!(controller.duration(), 2.0);
    assert_eq!(controller.repeat(), 1);
    assert_eq!(controller.ease(), &Easing::Linear);

    // instance options win over defaults
    let id = anim.create(ControllerOptions::new().duration(0.5));
    assert_eq!(anim.controller(id).map(Controller::duration), Some(0.5));

    // timelines start from zero duration regardless of defaults
    let tl = anim.timeline(ControllerOptions::new());
    assert_eq!(anim.controller(tl).map(Controller::duration), Some(0.0));

    // configured defaults sit on top of the global ones
    set_global_defaults(&ControllerOptions::new().repeat(3).duration(4.0));
    let path = scratch_file(
        "animator.toml",
        r#"
        [defaults]
        duration = 0.25
        ease = "powerOut(1)"
        "#,
    );
    let config = AnimatorConfig::from_path(&path).expect("load config");
    let mut anim = Animator::from_config(&config);
    let id = anim.create(ControllerOptions::new());
    let controller = anim.controller(id).expect("controller");
    assert_eq!(controller.duration(), 0.25);
    assert_eq!(controller.repeat(), 3);
    assert_eq!(controller.ease(), &Easing::PowerOut(1.0));

    reset_global_defaults();
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_json_config_file() {
    let path = scratch_file("animator.json", r#"{"defaults": {"delay": 0.1, "alternate": true}}"#);
    let config = AnimatorConfig::from_path(&path).expect("load config");
    assert_eq!(config.defaults.delay, Some(0.1));
    assert_eq!(config.defaults.alternate, Some(true));
    let _ = std::fs::remove_file(path);
}
