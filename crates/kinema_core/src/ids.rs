//! Arena handles
//!
//! Controllers and targets live in slot maps owned by the animator. A
//! handle is only a lookup key: it never keeps the referenced node alive.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a controller (plain controller, tween or timeline)
    pub struct ControllerId;
    /// Handle to a registered animation target
    pub struct TargetId;
}
