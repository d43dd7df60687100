//! The flow-controlled streaming loop.
//!
//! The device only reports buffer occupancy in command responses, so every
//! capacity estimate is one round-trip stale. The scheduler sizes each batch
//! to the spare capacity implied by the last response; when the estimate
//! drops near zero it pauses briefly to let the device drain and then pads
//! the estimate upward, trading a small overshoot risk for never issuing
//! pathologically small batches.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{PlaybackState, BUFFER_CAPACITY};
use crate::session::{DacSession, LinkState};

/// Spare-capacity level below which the drain pause and pad kick in.
const LOW_CAPACITY_THRESHOLD: usize = 100;

/// How long to wait for the device to drain when capacity is low.
const DRAIN_PAUSE: Duration = Duration::from_millis(5);

/// Amount added to a low capacity estimate after the drain pause.
const CAPACITY_PAD: usize = 150;

// =============================================================================
// Scheduler Control
// =============================================================================

/// Thread-safe control handle for stopping a running scheduler.
///
/// Stopping keeps the scheduler from re-entering its loop; an in-flight
/// response wait is not actively cancelled. Closing the session is the only
/// hard-cancel path.
#[derive(Clone)]
pub struct SchedulerControl {
    running: Arc<AtomicBool>,
}

impl SchedulerControl {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Requests the scheduler to stop after the current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns true while the scheduler should keep looping.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Batch Planning
// =============================================================================

/// How many samples to submit next, and whether to pause first.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct BatchPlan {
    capacity: usize,
    pause: Option<Duration>,
}

impl BatchPlan {
    /// Plans the next batch from the device's last reported fullness.
    fn for_fullness(fullness: u16) -> Self {
        let spare = BUFFER_CAPACITY.saturating_sub(fullness as usize);
        if spare < LOW_CAPACITY_THRESHOLD {
            BatchPlan {
                capacity: spare + CAPACITY_PAD,
                pause: Some(DRAIN_PAUSE),
            }
        } else {
            BatchPlan {
                capacity: spare,
                pause: None,
            }
        }
    }
}

// =============================================================================
// Stream Scheduler
// =============================================================================

/// Continuously pulls sample batches from the session's source and feeds
/// them to the device, pacing against reported buffer occupancy.
///
/// Each iteration:
/// 1. idles (yielding the thread) until a sample source is installed,
/// 2. pulls one frame of available work from the source,
/// 3. prepares the playback engine if the device reports it idle,
/// 4. sizes the batch to spare capacity (with the low-capacity heuristic),
/// 5. submits the batch (empty batches included, since a write is also the
///    only way to refresh the occupancy estimate),
/// 6. issues `begin` if playback has not been established (or was lost to an
///    underrun).
///
/// Session errors propagate out of [`run`](Self::run); the caller decides
/// whether to reconnect and resume.
pub struct StreamScheduler {
    session: DacSession,
    control: SchedulerControl,
}

impl StreamScheduler {
    /// Wraps a connected session in a scheduler.
    pub fn new(session: DacSession) -> Self {
        Self {
            session,
            control: SchedulerControl::new(),
        }
    }

    /// Returns a cloneable handle for stopping the loop from another thread.
    pub fn control(&self) -> SchedulerControl {
        self.control.clone()
    }

    /// The underlying session.
    pub fn session(&self) -> &DacSession {
        &self.session
    }

    /// The underlying session, mutably.
    pub fn session_mut(&mut self) -> &mut DacSession {
        &mut self.session
    }

    /// Consumes the scheduler and returns the session.
    pub fn into_session(self) -> DacSession {
        self.session
    }

    /// Runs the streaming loop until stopped or a session error occurs.
    pub fn run(&mut self) -> Result<()> {
        debug!("streaming scheduler started");
        while self.control.is_running() {
            self.step()?;
        }
        debug!("streaming scheduler stopped");
        Ok(())
    }

    /// One iteration of the streaming loop.
    fn step(&mut self) -> Result<()> {
        let Some(mut frame) = self.session.pull_frame() else {
            // Nothing to stream from; stay responsive without spinning hard.
            thread::yield_now();
            return Ok(());
        };

        if self.session.playback_state() == PlaybackState::Idle {
            self.session.prepare()?;
        }

        let plan = BatchPlan::for_fullness(self.session.buffer_fullness());
        if let Some(pause) = plan.pause {
            thread::sleep(pause);
        }

        frame.truncate(plan.capacity);
        self.session.write_samples(&frame)?;

        if self.session.state() != LinkState::Playing {
            self.session.begin()?;
        }

        Ok(())
    }
}
