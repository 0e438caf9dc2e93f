// motion.rs — device attitude driving yaw/pitch, sampled off-thread and consumed on the view thread

use std::sync::mpsc::{channel, sync_channel, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::{DQuat, EulerRot};

use crate::controller::{InputController, ViewId};
use crate::orientation::OrientationState;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(20);
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// How the UI is currently rotated relative to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    /// Face up/down or not yet known; samples only refresh the baseline.
    Unknown,
}

/// 3-axis device orientation. Pitch is about the device X axis, roll about
/// Y, yaw about Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude(DQuat);

impl Attitude {
    pub const IDENTITY: Attitude = Attitude(DQuat::IDENTITY);

    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        Attitude(DQuat::from_euler(EulerRot::ZXY, yaw, pitch, roll))
    }

    pub fn from_quat(q: DQuat) -> Self {
        Attitude(q.normalize())
    }

    pub fn quat(&self) -> DQuat {
        self.0
    }

    /// (roll, pitch, yaw) in radians.
    pub fn euler(&self) -> (f64, f64, f64) {
        let (yaw, pitch, roll) = self.0.to_euler(EulerRot::ZXY);
        (roll, pitch, yaw)
    }

    pub fn roll(&self) -> f64 {
        self.euler().0
    }

    pub fn pitch(&self) -> f64 {
        self.euler().1
    }

    /// Rotation taking `baseline` to `self`.
    pub fn relative_to(&self, baseline: &Attitude) -> Attitude {
        Attitude(baseline.0.inverse() * self.0)
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

/// One attitude reading paired with the interface orientation at the time
/// it is consumed. `attitude == None` is a sample without data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub attitude: Option<Attitude>,
    pub orientation: InterfaceOrientation,
}

/// Projects a relative rotation onto view-space (yaw, pitch) deltas.
pub fn project(relative: &Attitude, orientation: InterfaceOrientation) -> Option<(f32, f32)> {
    let (roll, pitch, _) = relative.euler();
    let (roll, pitch) = (roll as f32, pitch as f32);
    match orientation {
        InterfaceOrientation::Portrait => Some((-roll, pitch)),
        InterfaceOrientation::PortraitUpsideDown => Some((roll, -pitch)),
        InterfaceOrientation::LandscapeLeft => Some((pitch, roll)),
        InterfaceOrientation::LandscapeRight => Some((-pitch, -roll)),
        InterfaceOrientation::Unknown => None,
    }
}

/// Platform attitude source. Readings are produced on the sensor's own
/// thread and pushed into `sink`; a `None` reading carries no data.
pub trait AttitudeSensor: Send {
    fn is_available(&self) -> bool;

    fn start(&mut self, interval: Duration, sink: SyncSender<Option<Attitude>>);

    fn stop(&mut self);
}

/// Hardware without an attitude sensor.
#[derive(Debug, Default)]
pub struct UnavailableSensor;

impl AttitudeSensor for UnavailableSensor {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self, _interval: Duration, _sink: SyncSender<Option<Attitude>>) {}

    fn stop(&mut self) {}
}

/// Replays a fixed list of readings on a worker thread, one per interval.
#[derive(Debug)]
pub struct ScriptedSensor {
    readings: Arc<Vec<Option<Attitude>>>,
    repeat: bool,
    /// Dropping the sender wakes the worker out of its wait.
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptedSensor {
    pub fn new(readings: Vec<Option<Attitude>>) -> Self {
        Self {
            readings: Arc::new(readings),
            repeat: false,
            stop: None,
            worker: None,
        }
    }

    /// Replays the readings forever.
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Slow side-to-side roll with a little pitch, for demos on desktops.
    pub fn sway(steps: usize, amplitude: f64) -> Self {
        let readings = (0..steps)
            .map(|i| {
                let t = i as f64 / steps as f64 * std::f64::consts::TAU;
                Some(Attitude::from_euler(
                    amplitude * t.sin(),
                    0.25 * amplitude * (2.0 * t).sin(),
                    0.0,
                ))
            })
            .collect();
        Self::new(readings).repeating()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl AttitudeSensor for ScriptedSensor {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, interval: Duration, sink: SyncSender<Option<Attitude>>) {
        self.stop();

        let readings = Arc::clone(&self.readings);
        let (stop_tx, stop_rx) = channel::<()>();
        let repeat = self.repeat;

        self.stop = Some(stop_tx);
        self.worker = Some(thread::spawn(move || loop {
            for reading in readings.iter() {
                match sink.try_send(*reading) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => log::debug!("motion queue full, sample dropped"),
                    Err(TrySendError::Disconnected(_)) => return,
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            if !repeat || readings.is_empty() {
                return;
            }
        }));
    }

    fn stop(&mut self) {
        // the worker is parked in recv_timeout and returns as soon as this drops
        drop(self.stop.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("scripted motion sensor thread panicked");
            }
        }
    }
}

impl Drop for ScriptedSensor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Rotates the view by the change in device attitude between consecutive
/// samples.
///
/// The first sample after enabling, and the first sample after the
/// interface orientation changes, only set the baseline. Every later sample
/// is applied relative to the one before it, then becomes the new baseline.
pub struct MotionInputController {
    sensor: Box<dyn AttitudeSensor>,
    view: Option<ViewId>,
    enabled: bool,
    inertia: f32,
    interval: Duration,
    capacity: usize,
    receiver: Option<Receiver<Option<Attitude>>>,
    interface_orientation: InterfaceOrientation,
    last_attitude: Option<Attitude>,
    last_orientation: Option<InterfaceOrientation>,
}

impl std::fmt::Debug for MotionInputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionInputController")
            .field("view", &self.view)
            .field("enabled", &self.enabled)
            .field("sampling", &self.receiver.is_some())
            .field("interface_orientation", &self.interface_orientation)
            .field("last_attitude", &self.last_attitude)
            .finish()
    }
}

impl MotionInputController {
    /// Starts enabled when the sensor is available.
    pub fn new(sensor: Box<dyn AttitudeSensor>) -> Self {
        Self::with_interval(sensor, DEFAULT_SAMPLE_INTERVAL, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_interval(sensor: Box<dyn AttitudeSensor>, interval: Duration, capacity: usize) -> Self {
        let enabled = sensor.is_available();
        Self {
            sensor,
            view: None,
            enabled,
            inertia: 0.0,
            interval,
            capacity: capacity.max(1),
            receiver: None,
            interface_orientation: InterfaceOrientation::default(),
            last_attitude: None,
            last_orientation: None,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        self.interval
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the sampling period and queue depth, restarting the sensor
    /// when it is running so the new values take effect.
    pub fn set_sampling(&mut self, interval: Duration, capacity: usize) {
        let capacity = capacity.max(1);
        if self.interval == interval && self.capacity == capacity {
            return;
        }
        self.interval = interval;
        self.capacity = capacity;
        if self.is_sampling() {
            self.stop_sampling();
            self.start_sampling();
        }
    }

    pub fn is_sensor_available(&self) -> bool {
        self.sensor.is_available()
    }

    pub fn is_sampling(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn interface_orientation(&self) -> InterfaceOrientation {
        self.interface_orientation
    }

    /// Orientation paired with readings drained by [`pump`](Self::pump).
    pub fn set_interface_orientation(&mut self, orientation: InterfaceOrientation) {
        self.interface_orientation = orientation;
    }

    pub fn baseline(&self) -> Option<(Attitude, InterfaceOrientation)> {
        self.last_attitude.zip(self.last_orientation)
    }

    /// Consumes one sample. Returns the (yaw, pitch) delta applied, if any.
    pub fn handle_sample(&mut self, sample: MotionSample, state: &mut OrientationState) -> Option<(f32, f32)> {
        if !self.is_listening() {
            return None;
        }
        let Some(attitude) = sample.attitude.filter(Attitude::is_finite) else {
            log::trace!("motion sample without attitude dropped");
            return None;
        };

        let baseline = match self.baseline() {
            Some((last, orientation)) if orientation == sample.orientation => last,
            _ => {
                self.last_attitude = Some(attitude);
                self.last_orientation = Some(sample.orientation);
                return None;
            }
        };
        self.last_attitude = Some(attitude);

        let relative = attitude.relative_to(&baseline);
        let (diff_yaw, diff_pitch) = project(&relative, sample.orientation)?;
        state.apply_yaw_delta(diff_yaw);
        state.apply_pitch_delta(diff_pitch);
        Some((diff_yaw, diff_pitch))
    }

    /// Drains readings marshaled from the sensor thread and applies them.
    pub fn pump(&mut self, state: &mut OrientationState) -> usize {
        let readings: Vec<Option<Attitude>> = match &self.receiver {
            Some(rx) => rx.try_iter().collect(),
            None => return 0,
        };
        let count = readings.len();
        for attitude in readings {
            let sample = MotionSample {
                attitude,
                orientation: self.interface_orientation,
            };
            self.handle_sample(sample, state);
        }
        count
    }

    fn start_sampling(&mut self) {
        if self.receiver.is_some() || !self.is_listening() {
            return;
        }
        let (tx, rx) = sync_channel(self.capacity);
        self.sensor.start(self.interval, tx);
        self.receiver = Some(rx);
        log::debug!("motion sampling started every {:?}", self.interval);
    }

    fn stop_sampling(&mut self) {
        self.sensor.stop();
        // dropping the receiver discards anything still in flight
        if self.receiver.take().is_some() {
            log::debug!("motion sampling stopped");
        }
        self.last_attitude = None;
        self.last_orientation = None;
    }
}

impl InputController for MotionInputController {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn view(&self) -> Option<ViewId> {
        self.view
    }

    fn bind(&mut self, view: Option<ViewId>) {
        self.stop_sampling();
        self.view = view;
        self.start_sampling();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.sensor.is_available() {
            log::warn!("{}", crate::i18n::tr("motion.unavailable"));
            self.enabled = false;
            return;
        }
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.start_sampling();
        } else {
            self.stop_sampling();
        }
        log::info!("motion control {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Motion has no inertia; the value is kept only for the common surface.
    fn inertia(&self) -> f32 {
        self.inertia
    }

    fn set_inertia(&mut self, inertia: f32) {
        self.inertia = inertia;
    }

    fn update(&mut self, _now: Instant, state: &mut OrientationState) {
        self.pump(state);
    }
}

impl Drop for MotionInputController {
    fn drop(&mut self) {
        self.sensor.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::{OrientationBounds, Range};

    fn wide_state() -> OrientationState {
        let bounds = OrientationBounds {
            yaw: Range::new(-10.0, 10.0),
            pitch: Range::new(-10.0, 10.0),
            ..Default::default()
        };
        OrientationState::new(bounds).unwrap()
    }

    fn listening() -> MotionInputController {
        let mut c = MotionInputController::new(Box::new(ScriptedSensor::new(Vec::new())));
        c.bind(Some(ViewId(7)));
        c
    }

    fn sample(roll: f64, pitch: f64, orientation: InterfaceOrientation) -> MotionSample {
        MotionSample {
            attitude: Some(Attitude::from_euler(roll, pitch, 0.0)),
            orientation,
        }
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-5 && (a.1 - b.1).abs() < 1e-5
    }

    #[test]
    fn euler_round_trip() {
        let a = Attitude::from_euler(0.2, -0.3, 0.4);
        let (roll, pitch, yaw) = a.euler();
        assert!((roll - 0.2).abs() < 1e-9);
        assert!((pitch + 0.3).abs() < 1e-9);
        assert!((yaw - 0.4).abs() < 1e-9);
    }

    #[test]
    fn relative_rotation_about_one_axis() {
        let base = Attitude::from_euler(0.1, 0.0, 0.0);
        let next = Attitude::from_euler(0.35, 0.0, 0.0);
        let rel = next.relative_to(&base);
        assert!((rel.roll() - 0.25).abs() < 1e-9);
        assert!(rel.pitch().abs() < 1e-9);
    }

    #[test]
    fn first_sample_only_sets_baseline() {
        let mut state = wide_state();
        let mut c = listening();
        assert_eq!(c.handle_sample(sample(0.3, 0.2, InterfaceOrientation::Portrait), &mut state), None);
        assert_eq!(state.yaw(), 0.0);
        assert_eq!(state.pitch(), 0.0);
        assert!(c.baseline().is_some());
    }

    #[test]
    fn four_orientation_mappings() {
        let (roll, pitch) = (0.04_f32, 0.07_f32);
        let cases = [
            (InterfaceOrientation::Portrait, (-roll, pitch)),
            (InterfaceOrientation::PortraitUpsideDown, (roll, -pitch)),
            (InterfaceOrientation::LandscapeLeft, (pitch, roll)),
            (InterfaceOrientation::LandscapeRight, (-pitch, -roll)),
        ];
        for (orientation, expected) in cases {
            let mut state = wide_state();
            let mut c = listening();
            c.handle_sample(sample(0.0, 0.0, orientation), &mut state);
            let diff = c
                .handle_sample(sample(roll as f64, pitch as f64, orientation), &mut state)
                .unwrap();
            assert!(close(diff, expected), "{orientation:?}: {diff:?} != {expected:?}");
            assert!(close((state.yaw(), state.pitch()), expected));
        }
    }

    #[test]
    fn orientation_change_resets_baseline() {
        let mut state = wide_state();
        let mut c = listening();
        c.handle_sample(sample(0.0, 0.0, InterfaceOrientation::Portrait), &mut state);
        let applied = c.handle_sample(sample(0.5, 0.5, InterfaceOrientation::LandscapeLeft), &mut state);
        assert_eq!(applied, None);
        assert_eq!(state.yaw(), 0.0);
        assert_eq!(c.baseline().unwrap().1, InterfaceOrientation::LandscapeLeft);
    }

    #[test]
    fn sliding_window_baseline() {
        let mut state = wide_state();
        let mut c = listening();
        let o = InterfaceOrientation::Portrait;
        c.handle_sample(sample(0.0, 0.0, o), &mut state);
        c.handle_sample(sample(0.1, 0.0, o), &mut state);
        let second = c.handle_sample(sample(0.15, 0.0, o), &mut state).unwrap();
        assert!(close(second, (-0.05, 0.0)));
        assert!((state.yaw() - (-0.15)).abs() < 1e-5);
    }

    #[test]
    fn empty_sample_dropped() {
        let mut state = wide_state();
        let mut c = listening();
        let empty = MotionSample {
            attitude: None,
            orientation: InterfaceOrientation::Portrait,
        };
        assert_eq!(c.handle_sample(empty, &mut state), None);
        assert!(c.baseline().is_none());
    }

    #[test]
    fn unknown_orientation_refreshes_baseline_only() {
        let mut state = wide_state();
        let mut c = listening();
        c.handle_sample(sample(0.0, 0.0, InterfaceOrientation::Unknown), &mut state);
        assert_eq!(c.handle_sample(sample(0.3, 0.3, InterfaceOrientation::Unknown), &mut state), None);
        assert_eq!(state.yaw(), 0.0);
        let (last, _) = c.baseline().unwrap();
        assert!((last.roll() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn unavailable_sensor_stays_disabled() {
        let mut c = MotionInputController::new(Box::new(UnavailableSensor));
        assert!(!c.is_enabled());
        c.bind(Some(ViewId(1)));
        c.set_enabled(true);
        assert!(!c.is_enabled());
        assert!(!c.is_sampling());
    }

    #[test]
    fn disabled_controller_ignores_samples() {
        let mut state = wide_state();
        let mut c = listening();
        c.set_enabled(false);
        let o = InterfaceOrientation::Portrait;
        c.handle_sample(sample(0.0, 0.0, o), &mut state);
        assert_eq!(c.handle_sample(sample(0.2, 0.2, o), &mut state), None);
        assert!(c.baseline().is_none());
    }

    #[test]
    fn sampling_follows_binding_and_enablement() {
        let mut c = MotionInputController::new(Box::new(ScriptedSensor::new(Vec::new())));
        assert!(c.is_enabled());
        assert!(!c.is_sampling());
        c.bind(Some(ViewId(3)));
        assert!(c.is_sampling());
        c.set_enabled(false);
        assert!(!c.is_sampling());
        c.bind(Some(ViewId(4)));
        assert!(!c.is_sampling());
        assert!(!c.is_enabled());
        c.set_enabled(true);
        assert!(c.is_sampling());
    }

    #[test]
    fn new_sampling_settings_restart_the_sensor() {
        let mut state = wide_state();
        let mut c = listening();
        let o = InterfaceOrientation::Portrait;
        c.handle_sample(sample(0.0, 0.0, o), &mut state);
        assert!(c.baseline().is_some());

        c.set_sampling(Duration::from_millis(5), 4);
        assert_eq!(c.sample_interval(), Duration::from_millis(5));
        assert_eq!(c.queue_capacity(), 4);
        assert!(c.is_sampling());
        // restarted streams start from a fresh baseline
        assert!(c.baseline().is_none());
    }

    #[test]
    fn stopping_a_slow_sensor_returns_promptly() {
        let reading = Some(Attitude::IDENTITY);
        let mut c = MotionInputController::with_interval(
            Box::new(ScriptedSensor::new(vec![reading; 4]).repeating()),
            Duration::from_secs(30),
            4,
        );
        c.bind(Some(ViewId(1)));
        assert!(c.is_sampling());

        let started = Instant::now();
        c.set_enabled(false);
        assert!(!c.is_sampling());
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
    }

    #[test]
    fn scripted_sensor_stops_without_waiting_out_its_interval() {
        let (tx, rx) = sync_channel(4);
        let mut sensor = ScriptedSensor::new(vec![None, None]).repeating();
        sensor.start(Duration::from_secs(30), tx);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(None));

        let started = Instant::now();
        sensor.stop();
        assert!(!sensor.is_running());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
