//! The per-frame animation loop.
//!
//! The loop itself is driven by redraw requests from the window (see
//! [`crate::flow`]); this module holds the state that advances on every
//! iteration: the clock, the time uniforms and the camera damping.

use instant::Instant;

use crate::{
    camera::CameraRig,
    data_structures::material::{MaterialRegistry, U_TIME, UniformValue, WeakMaterial},
};

/// Monotonic seconds since [`Clock::start`].
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    started: Option<Instant>,
    last: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            started: None,
            last: 0.0,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.last = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Elapsed seconds; `0.0` before the clock is started.
    pub fn elapsed(&mut self) -> f32 {
        let now = self
            .started
            .map(|started| started.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        self.observe(now)
    }

    fn observe(&mut self, seconds: f32) -> f32 {
        if seconds > self.last {
            self.last = seconds;
        }
        self.last
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// What one iteration produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub elapsed: f32,
}

/// Advances time uniforms and camera damping once per frame.
///
/// The loop only keeps weak references to the animated materials, so writes
/// to a material that no longer exists are skipped.
#[derive(Debug)]
pub struct AnimationLoop {
    state: LoopState,
    clock: Clock,
    frames: u64,
    animated: Vec<WeakMaterial>,
}

impl AnimationLoop {
    pub fn new(registry: &MaterialRegistry) -> Self {
        Self {
            state: LoopState::Idle,
            clock: Clock::new(),
            frames: 0,
            animated: registry
                .animated()
                .into_iter()
                .map(|material| material.downgrade())
                .collect(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Starts the clock. There is no way back to `Idle`.
    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            self.clock.start();
            self.state = LoopState::Running;
        }
    }

    /// Runs one iteration against the real clock.
    pub fn tick(&mut self, rig: &mut CameraRig) -> Frame {
        self.start();
        let elapsed = self.clock.elapsed();
        self.advance(elapsed, rig)
    }

    /// Runs one iteration with an externally measured elapsed time. Times
    /// earlier than the last observed one are held at the last value.
    pub fn tick_at(&mut self, seconds: f32, rig: &mut CameraRig) -> Frame {
        self.start();
        let elapsed = self.clock.observe(seconds);
        self.advance(elapsed, rig)
    }

    fn advance(&mut self, elapsed: f32, rig: &mut CameraRig) -> Frame {
        for material in &self.animated {
            material.set_uniform(U_TIME, UniformValue::Float(elapsed));
        }
        rig.controller.update(&mut rig.camera);
        self.frames += 1;
        Frame {
            index: self.frames,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_never_goes_backwards() {
        let mut clock = Clock::new();
        assert_eq!(clock.observe(1.0), 1.0);
        assert_eq!(clock.observe(0.5), 1.0);
        assert_eq!(clock.observe(2.0), 2.0);
    }

    #[test]
    fn unstarted_clock_reads_zero() {
        let mut clock = Clock::new();
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed(), 0.0);
    }
}
