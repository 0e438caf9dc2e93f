// gesture.rs — single-touch pan and pinch zoom, with inertia after the drag ends

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::controller::{InputController, ViewId};
use crate::inertia::{InertiaScheduler, DECAY_TICKS, DEFAULT_TICK_INTERVAL};
use crate::orientation::OrientationState;

pub const DEFAULT_INERTIA: f32 = 0.1;

/// Raw gesture input in view-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Any finger went down. Stops inertia even if no drag follows.
    TouchesBegan { touches: usize },
    DragBegan { point: [f32; 2], touches: usize },
    DragMoved { point: [f32; 2] },
    DragEnded,
    /// Drag aborted by the platform; no inertia.
    DragCancelled,
    PinchBegan,
    /// Cumulative scale since the pinch began.
    PinchChanged { scale: f32 },
    PinchEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recognizer {
    Pan,
    Pinch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Pixels of horizontal drag per radian of yaw.
    pub pan_divisor_x: f32,
    /// Pixels of vertical drag per radian of pitch.
    pub pan_divisor_y: f32,
    /// Fov multiplier per pinch sample when the fingers close.
    pub pinch_expansion: f32,
    /// Fov multiplier per pinch sample when the fingers open.
    pub pinch_reduction: f32,
    pub inertia_interval_ms: u64,
    pub inertia_ticks: u32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            pan_divisor_x: 500.0,
            pan_divisor_y: 500.0,
            pinch_expansion: 1.05,
            pinch_reduction: 0.95,
            inertia_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            inertia_ticks: DECAY_TICKS,
        }
    }
}

/// Drag to look around, pinch to zoom.
///
/// Only one recognizer drives the state at a time: whichever of pan or pinch
/// begins first owns the gesture until it ends.
#[derive(Debug)]
pub struct GestureInputController {
    view: Option<ViewId>,
    enabled: bool,
    inertia: f32,
    tuning: GestureTuning,

    active: Option<Recognizer>,
    is_dragging: bool,
    last_point: [f32; 2],
    last_delta: (f32, f32),
    prev_scale: f32,

    scheduler: InertiaScheduler,
}

impl Default for GestureInputController {
    fn default() -> Self {
        Self::new(GestureTuning::default())
    }
}

impl GestureInputController {
    pub fn new(tuning: GestureTuning) -> Self {
        Self {
            view: None,
            enabled: true,
            inertia: DEFAULT_INERTIA,
            tuning,
            active: None,
            is_dragging: false,
            last_point: [0.0, 0.0],
            last_delta: (0.0, 0.0),
            prev_scale: 1.0,
            scheduler: scheduler_for(&tuning),
        }
    }

    pub fn tuning(&self) -> &GestureTuning {
        &self.tuning
    }

    /// Swaps sensitivity and inertia timing. A running inertia task is
    /// dropped; the next drag end uses the new interval and tick budget.
    pub fn set_tuning(&mut self, tuning: GestureTuning) {
        if self.tuning == tuning {
            return;
        }
        self.tuning = tuning;
        self.scheduler = scheduler_for(&tuning);
        log::debug!("gesture tuning updated: {tuning:?}");
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn last_delta(&self) -> (f32, f32) {
        self.last_delta
    }

    pub fn scheduler(&self) -> &InertiaScheduler {
        &self.scheduler
    }

    pub fn is_inertia_running(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn handle(&mut self, event: GestureEvent, now: Instant, state: &mut OrientationState) {
        if !self.is_listening() {
            return;
        }

        match event {
            GestureEvent::TouchesBegan { .. } => {
                self.scheduler.cancel();
            }
            GestureEvent::DragBegan { point, touches } => {
                if touches != 1 {
                    log::trace!("rejecting {touches}-finger drag");
                    return;
                }
                if self.active == Some(Recognizer::Pinch) {
                    return;
                }
                self.scheduler.cancel();
                self.active = Some(Recognizer::Pan);
                self.is_dragging = true;
                self.last_point = point;
                self.last_delta = (0.0, 0.0);
            }
            GestureEvent::DragMoved { point } => {
                if !self.is_dragging {
                    return;
                }
                let dx = point[0] - self.last_point[0];
                let dy = point[1] - self.last_point[1];
                self.last_point = point;
                self.last_delta = (dx, dy);
                self.rotate(dx, dy, state);
            }
            GestureEvent::DragEnded => {
                if !self.is_dragging {
                    return;
                }
                self.end_drag();
                self.scheduler.start(now, self.inertia, self.last_delta);
            }
            GestureEvent::DragCancelled => {
                if self.is_dragging {
                    self.end_drag();
                }
            }
            GestureEvent::PinchBegan => {
                if self.active == Some(Recognizer::Pan) {
                    return;
                }
                self.active = Some(Recognizer::Pinch);
                self.prev_scale = 1.0;
            }
            GestureEvent::PinchChanged { scale } => {
                if self.active != Some(Recognizer::Pinch) || !scale.is_finite() {
                    return;
                }
                let factor = if scale < self.prev_scale {
                    self.tuning.pinch_expansion
                } else {
                    self.tuning.pinch_reduction
                };
                state.scale_field_of_view(factor);
                self.prev_scale = scale;
            }
            GestureEvent::PinchEnded => {
                if self.active == Some(Recognizer::Pinch) {
                    self.active = None;
                }
            }
        }
    }

    fn end_drag(&mut self) {
        self.is_dragging = false;
        self.active = None;
    }

    fn reset_gesture(&mut self) {
        self.scheduler.cancel();
        self.active = None;
        self.is_dragging = false;
        self.prev_scale = 1.0;
    }

    fn rotate(&self, dx: f32, dy: f32, state: &mut OrientationState) {
        state.apply_yaw_delta(-dx / self.tuning.pan_divisor_x);
        state.apply_pitch_delta(dy / self.tuning.pan_divisor_y);
    }
}

fn scheduler_for(tuning: &GestureTuning) -> InertiaScheduler {
    InertiaScheduler::new(Duration::from_millis(tuning.inertia_interval_ms), tuning.inertia_ticks)
}

impl InputController for GestureInputController {
    fn name(&self) -> &'static str {
        "gesture"
    }

    fn view(&self) -> Option<ViewId> {
        self.view
    }

    fn bind(&mut self, view: Option<ViewId>) {
        if let Some(old) = self.view.filter(|_| self.enabled) {
            log::debug!("gesture listeners detached from {old}");
        }
        self.reset_gesture();
        self.view = view;
        if let Some(new) = self.view.filter(|_| self.enabled) {
            log::debug!("gesture listeners attached to {new}");
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.reset_gesture();
        log::info!("gesture control {}", if enabled { "enabled" } else { "disabled" });
    }

    fn inertia(&self) -> f32 {
        self.inertia
    }

    fn set_inertia(&mut self, inertia: f32) {
        self.scheduler.cancel();
        self.inertia = if inertia.is_finite() {
            inertia.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn update(&mut self, now: Instant, state: &mut OrientationState) {
        if !self.is_listening() {
            self.scheduler.cancel();
            return;
        }
        let (div_x, div_y) = (self.tuning.pan_divisor_x, self.tuning.pan_divisor_y);
        self.scheduler.advance(now, |dx, dy| {
            state.apply_yaw_delta(-dx / div_x);
            state.apply_pitch_delta(dy / div_y);
        });
    }
}
