// controller.rs — what every input source driving the orientation has in common

use std::fmt;
use std::time::Instant;

use crate::orientation::OrientationState;

/// Non-owning handle to the view a controller is bound to.
///
/// Controllers never hold the view itself; the view (or its parent) owns the
/// controllers and passes its [`OrientationState`] in on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Disabled,
    Enabled,
}

impl From<bool> for Activation {
    fn from(enabled: bool) -> Self {
        if enabled {
            Activation::Enabled
        } else {
            Activation::Disabled
        }
    }
}

/// A source of yaw/pitch/fov changes.
///
/// Input is only consumed while the controller is enabled *and* bound to a
/// view; either transition away from that state detaches its listeners and
/// drops any pending work immediately.
pub trait InputController {
    fn name(&self) -> &'static str;

    fn view(&self) -> Option<ViewId>;

    /// Tears down listeners on the current view and attaches them to `view`.
    /// Enablement and inertia survive the rebind.
    fn bind(&mut self, view: Option<ViewId>);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn inertia(&self) -> f32;

    fn set_inertia(&mut self, inertia: f32);

    /// Periodic work due at `now`, run on the thread owning `state`.
    fn update(&mut self, now: Instant, state: &mut OrientationState);

    fn activation(&self) -> Activation {
        self.is_enabled().into()
    }

    fn is_listening(&self) -> bool {
        self.is_enabled() && self.view().is_some()
    }
}
