//! Kinema Animation
//!
//! Time control and composition on top of the style engine.
//!
//! # Features
//!
//! - **Controllers**: a progress state machine with delay, repeat,
//!   alternation, time scale and lifecycle events
//! - **Timelines**: children placed at absolute times, labels or relative
//!   expressions such as `"intro+=0.5"` or `"<-=25%"`
//! - **Tweens**: `to`, `from`, `from_to` and `set` over one or many targets
//! - **Stagger and keyframes**: expanded into inner timelines
//! - **Explicit driver**: [`Animator::tick`] advances everything by a delta;
//!   [`FrameClock`] measures it from real time
//!
//! # Example
//!
//! ```
//! use kinema_animation::{Animator, ControllerOptions};
//! use kinema_style::{property_map, testing::MemoryTarget};
//!
//! let mut animator = Animator::with_defaults(ControllerOptions::new().ease("linear"));
//! let target = animator.register_target(MemoryTarget::new().with_value("opacity", "1"));
//! animator.to(target, property_map([("opacity", 0.0)]), ControllerOptions::new().duration(2.0));
//!
//! animator.tick(1.0);
//! let opacity = animator.target(target).and_then(|t| t.read_value("opacity"));
//! assert_eq!(opacity.as_deref(), Some("0.5"));
//! ```

pub mod animator;
pub mod config;
pub mod controller;
pub mod easing;
pub mod keyframe;
pub mod options;
pub mod placement;
pub mod scheduler;
pub mod stagger;
pub mod targets;
pub mod timeline;
pub mod tween;

pub use animator::Animator;
pub use config::{global_defaults, reset_global_defaults, set_global_defaults, AnimatorConfig, ConfigError};
pub use controller::{Controller, PlayState};
pub use easing::Easing;
pub use keyframe::{KeyframeFrames, Keyframes};
pub use options::{ControllerOptions, ResolvedOptions};
pub use placement::{Placement, PlacementExpr};
pub use scheduler::FrameClock;
pub use stagger::{StaggerAxis, StaggerFrom, StaggerLayout, StaggerOptions};
pub use targets::{TargetRegistry, TargetResolver, Targets};
pub use timeline::{Attached, Timeline};
pub use tween::Tween;

pub use kinema_core::{ControllerEvent, ControllerId, EventContext, KinemaError, TargetId};
