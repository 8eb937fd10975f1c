//! Fixed-step timing for the simulation loop.
//!
//! Wall-clock time is accumulated and drained in whole simulation steps so
//! every tick sees the same `dt`.

use std::time::{Duration, Instant};

/// Most steps run for one wall-clock frame before the backlog is dropped.
pub const MAX_STEPS_PER_FRAME: u32 = 10;

/// Largest wall-clock delta accepted in one frame, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Fixed timestep accumulator.
#[derive(Debug)]
pub struct FixedStep {
    /// Fixed simulation delta
    fixed_dt: f32,
    /// Unsimulated time carried between frames
    accumulator: f32,
    /// Start of the current frame
    last_frame: Instant,
    /// Steps run since creation
    steps: u64,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl FixedStep {
    /// Creates an accumulator for steps of `fixed_dt` seconds.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001),
            accumulator: 0.0,
            last_frame: Instant::now(),
            steps: 0,
        }
    }

    /// The fixed step in seconds.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Steps handed out so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Wall-clock seconds since the previous call, clamped.
    pub fn frame_delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt.min(MAX_FRAME_DELTA)
    }

    /// Adds `dt` seconds and returns how many fixed steps are due.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog rather than spiral.
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.steps += u64::from(count);
        count
    }

    /// Leftover fraction of a step, in `[0, 1)`.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    /// Sleeps until one fixed step has passed since the frame started.
    pub fn sleep_remainder(&self) {
        let budget = Duration::from_secs_f32(self.fixed_dt);
        let elapsed = self.last_frame.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }

    /// Forgets accumulated time.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.accumulator = 0.0;
    }
}
