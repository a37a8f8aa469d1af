//! Frame timer with a deferred end action.
//!
//! ## State machine
//!
//! ┌──────────┬────────────────┬──────────────────────────────────────────┐
//! │ State     │ Call           │ Effect                                   │
//! ├──────────┼────────────────┼──────────────────────────────────────────┤
//! │ Idle      │ start()        │ → Running                                │
//! │ Idle      │ stop()         │ → Stopped (never runs a frame)           │
//! │ Running   │ run_frame(f)   │ f is called; Err(e) → stop(), Frame(e)   │
//! │ Running   │ stop()         │ → Stopped, then end action is sent       │
//! │ Stopped   │ start()        │ ignored                                  │
//! │ Stopped   │ stop()         │ ignored, nothing sent twice              │
//! │ any ≠Run  │ run_frame(f)   │ f is not called                          │
//! └──────────┴────────────────┴──────────────────────────────────────────┘
//!
//! The end action is never run inline. It is a value handed to the host's
//! task queue after the state change, so the host sees it on its next loop
//! iteration with the timer already stopped.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::warn;

use crate::error::TimerError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct FrameTimer<E> {
    state: TimerState,
    end_action: Option<E>,
    tasks: Sender<E>,
    elapsed: Duration,
    frames: u64,
}

impl<E> FrameTimer<E> {
    pub fn new(tasks: Sender<E>) -> Self {
        FrameTimer {
            state: TimerState::Idle,
            end_action: None,
            tasks,
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TimerState::Stopped
    }

    /// Returns whether the timer is running afterwards.
    pub fn start(&mut self) -> bool {
        if self.state == TimerState::Idle {
            self.state = TimerState::Running;
        }
        self.is_running()
    }

    /// Arm (or replace) the one-shot action delivered on stop.
    pub fn set_end_action(&mut self, action: E) {
        self.end_action = Some(action);
    }

    pub fn stop(&mut self) {
        if self.state == TimerState::Stopped {
            return;
        }
        self.state = TimerState::Stopped;
        if let Some(action) = self.end_action.take() {
            if self.tasks.send(action).is_err() {
                warn!("task queue closed, end action dropped");
            }
        }
    }

    /// Run one frame. `Ok(false)` when the timer was not running.
    pub fn run_frame<F, Err>(&mut self, dt: Duration, frame: F) -> Result<bool, TimerError<Err>>
    where
        F: FnOnce(Duration) -> Result<(), Err>,
        Err: std::error::Error + 'static,
    {
        if !self.is_running() {
            return Ok(false);
        }
        self.frames += 1;
        self.elapsed += dt;
        match frame(dt) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.stop();
                Err(TimerError::Frame(e))
            }
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sum of the frame times handed to `run_frame`.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
