// inertia.rs — repeating-task primitive and the post-drag decay it drives

use std::time::{Duration, Instant};

/// Invoke every `interval` until dropped or `limit` invocations elapsed.
///
/// Not tied to any event loop: the owner polls it with the current time and
/// runs one invocation per returned count. Dropping the task cancels it.
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    interval: Duration,
    limit: u32,
    next_due: Instant,
    fired: u32,
}

impl RepeatingTask {
    pub fn new(interval: Duration, limit: u32, now: Instant) -> Self {
        Self {
            interval,
            limit,
            next_due: now + interval,
            fired: 0,
        }
    }

    /// Number of invocations that became due up to `now`, marking them fired.
    pub fn due(&mut self, now: Instant) -> u32 {
        let mut count = 0;
        while !self.is_exhausted() && now >= self.next_due {
            self.fired += 1;
            count += 1;
            if self.interval.is_zero() {
                break;
            }
            self.next_due += self.interval;
        }
        count
    }

    pub fn fired(&self) -> u32 {
        self.fired
    }

    pub fn is_exhausted(&self) -> bool {
        self.fired >= self.limit
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}

/// Inertia only kicks in above this factor.
pub const INERTIA_THRESHOLD: f32 = 0.05;
/// Decay ticks after a drag, independent of the factor.
pub const DECAY_TICKS: u32 = 150;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Keeps a released drag moving.
///
/// Invocation 0 latches `decay_ratio = factor * 10`; invocations
/// `1..=ticks` each yield `delta * (1 / tick) * decay_ratio`, where `delta`
/// is the last drag-frame delta. After the last one the scheduler cancels
/// itself and resets its counters.
#[derive(Debug, Clone)]
pub struct InertiaScheduler {
    interval: Duration,
    ticks: u32,
    task: Option<RepeatingTask>,
    factor: f32,
    delta: (f32, f32),
    decay_tick_count: u32,
    decay_ratio: f32,
}

impl Default for InertiaScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, DECAY_TICKS)
    }
}

impl InertiaScheduler {
    pub fn new(interval: Duration, ticks: u32) -> Self {
        Self {
            interval,
            ticks,
            task: None,
            factor: 0.0,
            delta: (0.0, 0.0),
            decay_tick_count: 0,
            decay_ratio: 0.0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn decay_ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn decay_tick_count(&self) -> u32 {
        self.decay_tick_count
    }

    pub fn decay_ratio(&self) -> f32 {
        self.decay_ratio
    }

    /// Starts decaying `delta`. Returns false (and stays idle) when the
    /// factor is too small for inertia.
    pub fn start(&mut self, now: Instant, factor: f32, delta: (f32, f32)) -> bool {
        self.cancel();
        if factor <= INERTIA_THRESHOLD {
            return false;
        }
        self.factor = factor;
        self.delta = delta;
        // one setup invocation plus the decay ticks
        self.task = Some(RepeatingTask::new(self.interval, self.ticks + 1, now));
        log::debug!(
            "inertia started: factor={factor} delta=({}, {})",
            delta.0,
            delta.1
        );
        true
    }

    pub fn cancel(&mut self) {
        if self.task.take().is_some() {
            log::debug!("inertia cancelled after {} ticks", self.decay_tick_count);
        }
        self.decay_tick_count = 0;
        self.decay_ratio = 0.0;
    }

    /// Runs every invocation due at `now`, handing each decayed delta to
    /// `apply`. Checks for cancellation between invocations.
    pub fn advance(&mut self, now: Instant, mut apply: impl FnMut(f32, f32)) {
        let due = match self.task.as_mut() {
            Some(task) => task.due(now),
            None => return,
        };
        for _ in 0..due {
            if !self.is_active() {
                break;
            }
            if let Some((dx, dy)) = self.invoke() {
                apply(dx, dy);
            }
        }
        if self.task.as_ref().is_some_and(RepeatingTask::is_exhausted) {
            self.cancel();
        }
    }

    /// One invocation, regardless of time.
    pub fn tick(&mut self) -> Option<(f32, f32)> {
        if !self.is_active() {
            return None;
        }
        self.invoke()
    }

    fn invoke(&mut self) -> Option<(f32, f32)> {
        if self.decay_tick_count == 0 {
            self.decay_ratio = self.factor * 10.0;
            self.decay_tick_count = 1;
            return None;
        }

        let tick = self.decay_tick_count as f32;
        let step = (
            self.delta.0 * (1.0 / tick) * self.decay_ratio,
            self.delta.1 * (1.0 / tick) * self.decay_ratio,
        );

        if self.decay_tick_count >= self.ticks {
            log::debug!("inertia finished after {} ticks", self.decay_tick_count);
            self.task = None;
            self.decay_tick_count = 0;
            self.decay_ratio = 0.0;
        } else {
            self.decay_tick_count += 1;
        }
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_fires_on_interval_until_limit() {
        let t0 = Instant::now();
        let mut task = RepeatingTask::new(Duration::from_millis(20), 3, t0);
        assert_eq!(task.due(t0), 0);
        assert_eq!(task.due(t0 + Duration::from_millis(19)), 0);
        assert_eq!(task.due(t0 + Duration::from_millis(20)), 1);
        assert_eq!(task.due(t0 + Duration::from_millis(100)), 2);
        assert!(task.is_exhausted());
        assert_eq!(task.due(t0 + Duration::from_secs(10)), 0);
    }

    #[test]
    fn below_threshold_never_starts() {
        let mut inertia = InertiaScheduler::default();
        assert!(!inertia.start(Instant::now(), 0.05, (10.0, 0.0)));
        assert!(!inertia.is_active());
        assert_eq!(inertia.tick(), None);
    }

    #[test]
    fn exactly_the_tick_budget_then_self_cancels() {
        let mut inertia = InertiaScheduler::default();
        assert!(inertia.start(Instant::now(), 0.5, (4.0, -2.0)));

        assert_eq!(inertia.tick(), None);
        assert_eq!(inertia.decay_ratio(), 5.0);

        let mut steps = Vec::new();
        while let Some(step) = inertia.tick() {
            steps.push(step);
        }
        assert_eq!(steps.len(), DECAY_TICKS as usize);
        assert_eq!(steps[0], (20.0, -10.0));
        assert_eq!(steps[1], (10.0, -5.0));
        assert!((steps[149].0 - 20.0 / 150.0).abs() < 1e-6);
        assert!(!inertia.is_active());
        assert_eq!(inertia.decay_tick_count(), 0);
        assert_eq!(inertia.decay_ratio(), 0.0);
    }

    #[test]
    fn advance_follows_the_clock() {
        let t0 = Instant::now();
        let mut inertia = InertiaScheduler::default();
        inertia.start(t0, 0.1, (1.0, 0.0));

        let mut applied = 0;
        inertia.advance(t0 + Duration::from_millis(20), |_, _| applied += 1);
        assert_eq!(applied, 0, "setup invocation applies nothing");
        inertia.advance(t0 + Duration::from_millis(60), |_, _| applied += 1);
        assert_eq!(applied, 2);
        inertia.advance(t0 + Duration::from_secs(60), |_, _| applied += 1);
        assert_eq!(applied, DECAY_TICKS);
        assert!(!inertia.is_active());
    }

    #[test]
    fn cancel_resets_counters() {
        let mut inertia = InertiaScheduler::default();
        inertia.start(Instant::now(), 0.8, (1.0, 1.0));
        inertia.tick();
        inertia.tick();
        inertia.cancel();
        assert!(!inertia.is_active());
        assert_eq!(inertia.decay_tick_count(), 0);
        assert_eq!(inertia.tick(), None);
    }
}
