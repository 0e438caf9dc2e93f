// panorama.rs — the view: owns orientation, sphere mesh and both input controllers

use std::time::{Duration, Instant};

use crate::config::ViewerConfig;
use crate::controller::{InputController, ViewId};
use crate::error::Result;
use crate::gesture::{GestureEvent, GestureInputController};
use crate::mesh::SphereMesh;
use crate::motion::{AttitudeSensor, InterfaceOrientation, MotionInputController};
use crate::orientation::{Orientation, OrientationState, ViewObserver};

/// Everything a rendered photo sphere needs besides the GPU.
///
/// Controllers only know this view by its [`ViewId`]; the view hands them
/// its orientation state on each call.
#[derive(Debug)]
pub struct PanoramaView {
    id: ViewId,
    orientation: OrientationState,
    mesh: SphereMesh,
    gesture: GestureInputController,
    motion: MotionInputController,
}

impl PanoramaView {
    pub fn new(id: ViewId, config: &ViewerConfig, sensor: Box<dyn AttitudeSensor>) -> Result<Self> {
        config.validate()?;

        let orientation = OrientationState::with_initial(
            config.bounds,
            config.initial.yaw,
            config.initial.pitch,
            config.initial.fov,
        )?;
        let mesh = SphereMesh::generate(config.mesh.radius, config.mesh.divisions, config.mesh.yaw_offset)?;

        let mut gesture = GestureInputController::new(config.gesture);
        gesture.set_inertia(config.inertia.factor());
        gesture.set_enabled(config.gesture_control_enabled);
        gesture.bind(Some(id));

        let mut motion = MotionInputController::with_interval(
            sensor,
            Duration::from_millis(config.motion_interval_ms),
            config.motion_queue_capacity,
        );
        if !config.motion_control_enabled {
            motion.set_enabled(false);
        } else if !motion.is_enabled() {
            // surfaces the missing-sensor diagnostic
            motion.set_enabled(true);
        }
        motion.bind(Some(id));

        Ok(Self {
            id,
            orientation,
            mesh,
            gesture,
            motion,
        })
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn orientation(&self) -> &OrientationState {
        &self.orientation
    }

    pub fn orientation_mut(&mut self) -> &mut OrientationState {
        &mut self.orientation
    }

    /// What the renderer reads each frame.
    pub fn snapshot(&self) -> Orientation {
        self.orientation.snapshot()
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn gesture(&self) -> &GestureInputController {
        &self.gesture
    }

    pub fn motion(&self) -> &MotionInputController {
        &self.motion
    }

    pub fn set_observer(&mut self, observer: Box<dyn ViewObserver>) {
        self.orientation.set_observer(observer);
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn ViewObserver>> {
        self.orientation.take_observer()
    }

    pub fn handle_gesture(&mut self, event: GestureEvent, now: Instant) {
        self.gesture.handle(event, now, &mut self.orientation);
    }

    pub fn set_interface_orientation(&mut self, orientation: InterfaceOrientation) {
        self.motion.set_interface_orientation(orientation);
    }

    /// Per-frame tick: runs due inertia and applies marshaled motion samples.
    pub fn update(&mut self, now: Instant) {
        let state = &mut self.orientation;
        let controllers: [&mut dyn InputController; 2] = [&mut self.gesture, &mut self.motion];
        for controller in controllers {
            controller.update(now, state);
        }
    }

    /// Regenerates the mesh when its parameters change. Returns whether a
    /// new mesh was built.
    pub fn set_mesh(&mut self, radius: f32, divisions: usize, yaw_offset: f64) -> Result<bool> {
        if self.mesh.matches(radius, divisions, yaw_offset) {
            return Ok(false);
        }
        self.mesh = SphereMesh::generate(radius, divisions, yaw_offset)?;
        Ok(true)
    }

    pub fn inertia(&self) -> f32 {
        self.gesture.inertia()
    }

    pub fn set_inertia(&mut self, inertia: f32) {
        self.gesture.set_inertia(inertia);
    }

    pub fn is_gesture_control_enabled(&self) -> bool {
        self.gesture.is_enabled()
    }

    pub fn set_gesture_control_enabled(&mut self, enabled: bool) {
        self.gesture.set_enabled(enabled);
    }

    pub fn is_motion_control_enabled(&self) -> bool {
        self.motion.is_enabled()
    }

    pub fn set_motion_control_enabled(&mut self, enabled: bool) {
        self.motion.set_enabled(enabled);
    }

    /// Moves both controllers to a new view identity, keeping their settings.
    pub fn rebind(&mut self, id: ViewId) {
        self.id = id;
        self.gesture.bind(Some(id));
        self.motion.bind(Some(id));
    }

    /// Applies a reloaded configuration to the live view.
    pub fn apply_config(&mut self, config: &ViewerConfig) -> Result<()> {
        config.validate()?;
        self.orientation.set_bounds(config.bounds)?;
        self.set_mesh(config.mesh.radius, config.mesh.divisions, config.mesh.yaw_offset)?;
        self.gesture.set_tuning(config.gesture);
        self.set_inertia(config.inertia.factor());
        self.set_gesture_control_enabled(config.gesture_control_enabled);
        self.motion.set_sampling(
            Duration::from_millis(config.motion_interval_ms),
            config.motion_queue_capacity,
        );
        self.set_motion_control_enabled(config.motion_control_enabled);
        Ok(())
    }
}
