//! One-shot timers and the debounced save scheduler.
//!
//! Nothing here spawns threads or sleeps. The control loop that owns the
//! notes passes the current [`Instant`] in and the timers decide whether
//! they are due, so every save happens on the same thread as every edit.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::storage::NoteStore;

/// Something that can persist the live collection.
pub trait Persist {
    fn persist(&self);
}

impl Persist for NoteStore {
    fn persist(&self) {
        self.save();
    }
}

/// A cancellable single-shot timer. Re-arming replaces the pending deadline.
#[derive(Debug, Clone)]
pub struct OneShotTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl OneShotTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start (or restart) the countdown from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and return true if the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Coalesces bursts of edits into one save.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    timer: OneShotTimer,
    saves_performed: u64,
}

impl SaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            timer: OneShotTimer::new(delay),
            saves_performed: 0,
        }
    }

    /// Arm the debounce timer, restarting it if a save is already pending.
    pub fn schedule_save(&mut self, now: Instant) {
        if self.timer.is_armed() {
            debug!("Save already pending, restarting debounce");
        }
        self.timer.arm(now);
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Drop a pending save without performing it.
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    /// Save once if the debounce interval has elapsed.
    pub fn poll<P: Persist + ?Sized>(&mut self, now: Instant, target: &P) -> bool {
        if !self.timer.fire_if_due(now) {
            return false;
        }
        self.run(target);
        true
    }

    /// Save right away if a save is pending.
    pub fn flush<P: Persist + ?Sized>(&mut self, target: &P) -> bool {
        if !self.timer.is_armed() {
            return false;
        }
        self.timer.cancel();
        self.run(target);
        true
    }

    /// Number of debounced saves this scheduler has carried out.
    pub fn saves_performed(&self) -> u64 {
        self.saves_performed
    }

    fn run<P: Persist + ?Sized>(&mut self, target: &P) {
        self.saves_performed += 1;
        debug!(saves = self.saves_performed, "Debounced save");
        target.persist();
    }
}
