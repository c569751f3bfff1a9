//! Kinema Core
//!
//! Foundational pieces shared by the Kinema crates:
//!
//! - **Errors**: one taxonomy for every degraded-input case
//! - **Diagnostics**: a pluggable warning channel, `tracing` by default
//! - **Handles**: slot-map keys for controllers and targets
//! - **Events**: six lifecycle events with a typed observer
//! - **Geometry**: 4x4 matrices and RGBA colors

pub mod diagnostics;
pub mod error;
pub mod events;
pub mod geometry;
pub mod ids;

pub use diagnostics::{Warning, WarningKind, WarningSink};
pub use error::{KinemaError, Result};
pub use events::{ControllerEvent, ControllerObserver, EventContext, EventDispatcher, EventLog};
pub use geometry::{Mat4, Rgba};
pub use ids::{ControllerId, TargetId};
