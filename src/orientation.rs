// orientation.rs — yaw / pitch / field of view with enforced bounds and change notification

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PanoramaError, Result};

/// Receives a call for every actual change of the orientation state, on the
/// thread that made the change.
pub trait ViewObserver {
    fn on_fov_changed(&mut self, fov: f32);
    fn on_yaw_changed(&mut self, yaw: f32);
    fn on_pitch_changed(&mut self, pitch: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Yaw,
    Pitch,
    FieldOfView,
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    /// Wraps `v` into `[min, max)`.
    pub fn wrap(&self, v: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return self.min;
        }
        self.min + (v - self.min).rem_euclid(span)
    }

    pub fn contains(&self, v: f32) -> bool {
        (self.min..=self.max).contains(&v)
    }

    /// Position of `v` inside the range as 0..1.
    pub fn normalize(&self, v: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            (v - self.min) / span
        }
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PanoramaError::InvalidParameter(format!(
                "{name} bounds must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(PanoramaError::InvalidParameter(format!(
                "{name} min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Limits for every axis. Yaw and pitch are in radians, fov in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationBounds {
    pub yaw: Range,
    pub pitch: Range,
    pub fov: Range,
    /// Wrap yaw around instead of clamping it.
    pub cyclic_yaw: bool,
}

impl Default for OrientationBounds {
    fn default() -> Self {
        Self {
            yaw: Range::new(-PI, PI),
            pitch: Range::new(-FRAC_PI_2, FRAC_PI_2),
            fov: Range::new(30.0, 100.0),
            cyclic_yaw: false,
        }
    }
}

impl OrientationBounds {
    pub fn validate(&self) -> Result<()> {
        self.yaw.validate("yaw")?;
        self.pitch.validate("pitch")?;
        self.fov.validate("fov")?;
        if self.fov.min <= 0.0 {
            return Err(PanoramaError::InvalidParameter(format!(
                "fov min must be positive, got {}",
                self.fov.min
            )));
        }
        Ok(())
    }

    fn fit_yaw(&self, v: f32) -> f32 {
        if self.cyclic_yaw {
            self.yaw.wrap(v)
        } else {
            self.yaw.clamp(v)
        }
    }
}

/// Plain copy of the current orientation, what the renderer reads per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

pub const DEFAULT_FOV: f32 = 45.0;

/// Single source of truth for where the camera looks.
///
/// Every mutator fits the value into [`OrientationBounds`] before storing
/// it, and the observer only hears about values that actually changed.
/// The state is not `Send` (the observer is a plain boxed trait object), so
/// all mutation stays on the thread that owns the view; sensor threads
/// reach it through a channel.
pub struct OrientationState {
    yaw: f32,
    pitch: f32,
    fov: f32,
    bounds: OrientationBounds,
    observer: Option<Box<dyn ViewObserver>>,
}

impl fmt::Debug for OrientationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrientationState")
            .field("yaw", &self.yaw)
            .field("pitch", &self.pitch)
            .field("fov", &self.fov)
            .field("bounds", &self.bounds)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Default for OrientationState {
    fn default() -> Self {
        let bounds = OrientationBounds::default();
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV,
            bounds,
            observer: None,
        }
    }
}

impl OrientationState {
    pub fn new(bounds: OrientationBounds) -> Result<Self> {
        Self::with_initial(bounds, 0.0, 0.0, DEFAULT_FOV)
    }

    pub fn with_initial(bounds: OrientationBounds, yaw: f32, pitch: f32, fov: f32) -> Result<Self> {
        bounds.validate()?;
        let finite = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Ok(Self {
            yaw: bounds.fit_yaw(finite(yaw, 0.0)),
            pitch: bounds.pitch.clamp(finite(pitch, 0.0)),
            fov: bounds.fov.clamp(finite(fov, DEFAULT_FOV)),
            bounds,
            observer: None,
        })
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn field_of_view(&self) -> f32 {
        self.fov
    }

    pub fn bounds(&self) -> &OrientationBounds {
        &self.bounds
    }

    pub fn snapshot(&self) -> Orientation {
        Orientation {
            yaw: self.yaw,
            pitch: self.pitch,
            fov: self.fov,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn ViewObserver>) {
        self.observer = Some(observer);
    }

    /// Detaches the observer so the caller can drive the state without
    /// hearing its own changes echoed back.
    pub fn take_observer(&mut self) -> Option<Box<dyn ViewObserver>> {
        self.observer.take()
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    pub fn set_yaw(&mut self, v: f32) -> bool {
        if !v.is_finite() {
            log::debug!("ignoring non-finite yaw {v}");
            return false;
        }
        let fitted = self.bounds.fit_yaw(v);
        self.store(Axis::Yaw, fitted)
    }

    pub fn set_pitch(&mut self, v: f32) -> bool {
        if !v.is_finite() {
            log::debug!("ignoring non-finite pitch {v}");
            return false;
        }
        let fitted = self.bounds.pitch.clamp(v);
        self.store(Axis::Pitch, fitted)
    }

    pub fn set_field_of_view(&mut self, v: f32) -> bool {
        if !v.is_finite() {
            log::debug!("ignoring non-finite fov {v}");
            return false;
        }
        let fitted = self.bounds.fov.clamp(v);
        self.store(Axis::FieldOfView, fitted)
    }

    pub fn apply_yaw_delta(&mut self, d: f32) -> bool {
        self.set_yaw(self.yaw + d)
    }

    pub fn apply_pitch_delta(&mut self, d: f32) -> bool {
        self.set_pitch(self.pitch + d)
    }

    /// Multiplies the fov, the way pinch zoom steps it.
    pub fn scale_field_of_view(&mut self, factor: f32) -> bool {
        self.set_field_of_view(self.fov * factor)
    }

    pub fn normalized(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Yaw => self.bounds.yaw.normalize(self.yaw),
            Axis::Pitch => self.bounds.pitch.normalize(self.pitch),
            Axis::FieldOfView => self.bounds.fov.normalize(self.fov),
        }
    }

    /// Sets an axis from a 0..1 position inside its range (slider input).
    pub fn set_normalized(&mut self, axis: Axis, t: f32) -> bool {
        match axis {
            Axis::Yaw => self.set_yaw(self.bounds.yaw.lerp(t)),
            Axis::Pitch => self.set_pitch(self.bounds.pitch.lerp(t)),
            Axis::FieldOfView => self.set_field_of_view(self.bounds.fov.lerp(t)),
        }
    }

    /// Replaces the bounds and refits the current values into them.
    pub fn set_bounds(&mut self, bounds: OrientationBounds) -> Result<()> {
        bounds.validate()?;
        self.bounds = bounds;
        let (yaw, pitch, fov) = (self.yaw, self.pitch, self.fov);
        self.set_yaw(yaw);
        self.set_pitch(pitch);
        self.set_field_of_view(fov);
        Ok(())
    }

    /// Back to yaw 0, pitch 0 and the default fov.
    pub fn reset(&mut self) {
        self.set_yaw(0.0);
        self.set_pitch(0.0);
        self.set_field_of_view(DEFAULT_FOV);
    }

    fn store(&mut self, axis: Axis, value: f32) -> bool {
        let slot = match axis {
            Axis::Yaw => &mut self.yaw,
            Axis::Pitch => &mut self.pitch,
            Axis::FieldOfView => &mut self.fov,
        };
        if *slot == value {
            return false;
        }
        *slot = value;

        if let Some(observer) = self.observer.as_mut() {
            match axis {
                Axis::Yaw => observer.on_yaw_changed(value),
                Axis::Pitch => observer.on_pitch_changed(value),
                Axis::FieldOfView => observer.on_fov_changed(value),
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<(Axis, f32)>>>);

    impl ViewObserver for Recorder {
        fn on_fov_changed(&mut self, fov: f32) {
            self.0.borrow_mut().push((Axis::FieldOfView, fov));
        }
        fn on_yaw_changed(&mut self, yaw: f32) {
            self.0.borrow_mut().push((Axis::Yaw, yaw));
        }
        fn on_pitch_changed(&mut self, pitch: f32) {
            self.0.borrow_mut().push((Axis::Pitch, pitch));
        }
    }

    fn observed(state: &mut OrientationState) -> Rc<RefCell<Vec<(Axis, f32)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        state.set_observer(Box::new(Recorder(log.clone())));
        log
    }

    #[test]
    fn setters_clamp_into_bounds() {
        let mut state = OrientationState::default();
        state.set_yaw(10.0);
        assert_eq!(state.yaw(), PI);
        state.set_pitch(-10.0);
        assert_eq!(state.pitch(), -FRAC_PI_2);
        state.set_field_of_view(500.0);
        assert_eq!(state.field_of_view(), 100.0);
        state.set_field_of_view(1.0);
        assert_eq!(state.field_of_view(), 30.0);
    }

    #[test]
    fn same_value_notifies_once() {
        let mut state = OrientationState::default();
        let log = observed(&mut state);
        assert!(state.set_yaw(1.0));
        assert!(!state.set_yaw(1.0));
        assert_eq!(log.borrow().as_slice(), &[(Axis::Yaw, 1.0)]);
    }

    #[test]
    fn clamped_no_op_is_silent() {
        let mut state = OrientationState::default();
        state.set_pitch(5.0);
        let log = observed(&mut state);
        assert!(!state.apply_pitch_delta(0.5));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let mut state = OrientationState::default();
        let log = observed(&mut state);
        assert!(!state.set_yaw(f32::NAN));
        assert!(!state.apply_pitch_delta(f32::INFINITY));
        assert!(!state.set_field_of_view(f32::NEG_INFINITY));
        assert_eq!(state.snapshot(), OrientationState::default().snapshot());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cyclic_yaw_wraps() {
        let bounds = OrientationBounds {
            cyclic_yaw: true,
            ..Default::default()
        };
        let mut state = OrientationState::new(bounds).unwrap();
        state.set_yaw(PI - 0.1);
        state.apply_yaw_delta(0.3);
        assert!((state.yaw() - (-PI + 0.2)).abs() < 1e-5);
        assert!(state.bounds().yaw.contains(state.yaw()));
    }

    #[test]
    fn detached_observer_misses_changes() {
        let mut state = OrientationState::default();
        let log = observed(&mut state);
        let observer = state.take_observer().unwrap();
        state.set_normalized(Axis::FieldOfView, 1.0);
        state.set_observer(observer);
        state.set_normalized(Axis::FieldOfView, 0.0);
        assert_eq!(log.borrow().as_slice(), &[(Axis::FieldOfView, 30.0)]);
    }

    #[test]
    fn normalized_round_trips_slider_position() {
        let mut state = OrientationState::default();
        state.set_normalized(Axis::Pitch, 0.25);
        assert!((state.normalized(Axis::Pitch) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn invalid_bounds_rejected() {
        let bounds = OrientationBounds {
            pitch: Range::new(1.0, -1.0),
            ..Default::default()
        };
        assert!(OrientationState::new(bounds).is_err());

        let bounds = OrientationBounds {
            fov: Range::new(0.0, 90.0),
            ..Default::default()
        };
        assert!(OrientationState::new(bounds).is_err());

        let bounds = OrientationBounds {
            yaw: Range::new(f32::NEG_INFINITY, 0.0),
            ..Default::default()
        };
        assert!(OrientationState::new(bounds).is_err());
    }

    #[test]
    fn narrowing_bounds_refits_values() {
        let mut state = OrientationState::default();
        state.set_field_of_view(90.0);
        let log = observed(&mut state);
        state
            .set_bounds(OrientationBounds {
                fov: Range::new(30.0, 60.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.field_of_view(), 60.0);
        assert_eq!(log.borrow().as_slice(), &[(Axis::FieldOfView, 60.0)]);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x9e37_79b9);
        let mut state = OrientationState::default();
        for _ in 0..10_000 {
            let d: f32 = rng.gen_range(-10.0..=10.0);
            match rng.gen_range(0..3) {
                0 => state.apply_yaw_delta(d),
                1 => state.apply_pitch_delta(d),
                _ => state.set_field_of_view(state.field_of_view() + d * 10.0),
            };
            let b = *state.bounds();
            assert!(b.yaw.contains(state.yaw()));
            assert!(b.pitch.contains(state.pitch()));
            assert!(b.fov.contains(state.field_of_view()));
        }
    }
}
