//! Photo sphere core: tessellates the sphere an equirectangular image is
//! mapped onto, and keeps the camera orientation that touch gestures and
//! device motion drive.
//!
//! The renderer reads [`PanoramaView::snapshot`] and [`PanoramaView::mesh`]
//! every frame; everything else here is input handling.

pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod i18n;
pub mod inertia;
pub mod mesh;
pub mod motion;
pub mod orientation;
pub mod panorama;

pub use config::{Inertia, InertiaSetting, ViewerConfig};
pub use controller::{Activation, InputController, ViewId};
pub use error::{ConfigError, PanoramaError, Result};
pub use gesture::{GestureEvent, GestureInputController, GestureTuning};
pub use inertia::{InertiaScheduler, RepeatingTask};
pub use mesh::{SphereBand, SphereMesh, SphereVertex};
pub use motion::{
    Attitude, AttitudeSensor, InterfaceOrientation, MotionInputController, MotionSample,
    ScriptedSensor, UnavailableSensor,
};
pub use orientation::{Axis, Orientation, OrientationBounds, OrientationState, Range, ViewObserver};
pub use panorama::PanoramaView;
