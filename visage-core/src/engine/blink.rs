//! Blink scheduler: an endless, randomised eyes-closed / eyes-open loop.
//!
//! ## Cycle
//!
//! ```text
//! wait U[interval_ms) → with p = probability: close, wait U[closed_ms), open
//! ```
//!
//! The loop only ever touches the eyes channel of the surface and never reads
//! playback state, so speaking and blinking run side by side.
//!
//! Every eyes command is issued while holding the scheduler's state lock,
//! right after checking that the loop's generation is still the running one.
//! `stop()` clears the running generation under the same lock before it opens
//! the eyes, so a close that was already in flight lands first and a stopped
//! loop cannot close the eyes again.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::playback::AnimatorDiagnostics;
use super::BlinkConfig;
use crate::error::{Result, VisageError};
use crate::surface::SurfaceHandle;

#[derive(Default)]
struct BlinkState {
    /// Bumped on every `start()`; identifies the loop allowed to draw.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl BlinkState {
    fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && self.generation == generation
    }
}

pub struct BlinkScheduler {
    surface: SurfaceHandle,
    config: BlinkConfig,
    diagnostics: Arc<AnimatorDiagnostics>,
    state: Arc<Mutex<BlinkState>>,
}

impl BlinkScheduler {
    pub fn new(
        surface: SurfaceHandle,
        config: BlinkConfig,
        diagnostics: Arc<AnimatorDiagnostics>,
    ) -> Self {
        Self {
            surface,
            config,
            diagnostics,
            state: Arc::new(Mutex::new(BlinkState::default())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the loop. Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// - `VisageError::AlreadyBlinking` if the loop is running.
    /// - `VisageError::InvalidConfig` if the config does not validate.
    pub fn start(&self) -> Result<()> {
        self.config.validate()?;

        let mut state = self.state.lock();
        if state.task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(VisageError::AlreadyBlinking);
        }

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        state.generation += 1;
        let blink_loop = BlinkLoop {
            generation: state.generation,
            surface: self.surface.clone(),
            config: self.config.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
            state: Arc::clone(&self.state),
        };
        state.task = Some(tokio::spawn(blink_loop.run(rng)));

        info!(
            generation = state.generation,
            seeded = self.config.seed.is_some(),
            "blink loop started"
        );
        Ok(())
    }

    /// Stop the loop and leave the eyes open. No-op when not running.
    ///
    /// Waits for an eyes command the loop is issuing right now, so the final
    /// "open" is always the last eyes command.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let Some(handle) = state.task.take() else {
            return;
        };
        handle.abort();
        self.surface.set_eyes_closed(false);
        info!(generation = state.generation, "blink loop stopped");
    }
}

impl Drop for BlinkScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.state.lock().task.take() {
            handle.abort();
        }
    }
}

struct BlinkLoop {
    generation: u64,
    surface: SurfaceHandle,
    config: BlinkConfig,
    diagnostics: Arc<AnimatorDiagnostics>,
    state: Arc<Mutex<BlinkState>>,
}

impl BlinkLoop {
    async fn run(self, mut rng: StdRng) {
        loop {
            let wait = rng.gen_range(self.config.interval_ms.clone());
            tokio::time::sleep(Duration::from_millis(wait)).await;

            if !rng.gen_bool(self.config.probability) {
                continue;
            }

            let closed_for = rng.gen_range(self.config.closed_ms.clone());
            if !self.set_eyes_closed(true) {
                return;
            }
            self.diagnostics.blinks.fetch_add(1, Ordering::Relaxed);
            debug!(closed_ms = closed_for, "blink");

            tokio::time::sleep(Duration::from_millis(closed_for)).await;
            if !self.set_eyes_closed(false) {
                return;
            }
        }
    }

    /// Issue an eyes command if this loop is still the running one.
    fn set_eyes_closed(&self, closed: bool) -> bool {
        let state = self.state.lock();
        if !state.is_current(self.generation) {
            debug!(generation = self.generation, "stale blink loop exiting");
            return false;
        }
        self.surface.set_eyes_closed(closed);
        true
    }
}
