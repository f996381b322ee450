//! Interrupt capture and deferred replay for submission runs.
//!
//! An external interrupt (Ctrl-C) is the only cancellation source. The
//! handler never terminates the process by itself: it records the signal in
//! a shared flag. The coordinator brackets critical regions (a remote call
//! and the bookkeeping that tracks its result) with [`InterruptGuard::arm`];
//! inside such a region the flag is never observed, so the call and its
//! mutation cannot be torn apart. [`ArmedSection::disarm`] replays a recorded
//! interrupt as an error, and unarmed phases poll the flag between job
//! iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Replayed at a disarm point (or observed at a poll point) after an
/// interrupt arrived. Stops new work from being issued; already-armed
/// bookkeeping has completed by the time this is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("submission interrupted")]
pub struct Interrupted;

/// Shared interrupt flag.
///
/// Production wires it to the process signal handler; tests call
/// [`InterruptState::trigger`] directly.
#[derive(Debug, Default)]
pub struct InterruptState {
    received: AtomicBool,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt. Returns true the first time.
    pub fn trigger(&self) -> bool {
        !self.received.swap(true, Ordering::SeqCst)
    }

    /// Whether an interrupt has been recorded.
    pub fn is_interrupted(&self) -> bool {
        self.received.load(Ordering::SeqCst)
    }
}

/// Guard owning the interrupt flag for one submission run.
pub struct InterruptGuard {
    state: Arc<InterruptState>,
}

impl InterruptGuard {
    /// Guard with no process-wide handler. Tests trigger the state directly.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(InterruptState::new()),
        }
    }

    /// Guard over an existing state.
    pub fn with_state(state: Arc<InterruptState>) -> Self {
        Self { state }
    }

    /// Install the process-wide handler. The first signal prints a one-line
    /// notice; delivery is otherwise deferred to the guard's checkpoints.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let state = Arc::new(InterruptState::new());
        let handler_state = Arc::clone(&state);
        ctrlc::set_handler(move || {
            if handler_state.trigger() {
                eprintln!("\nCancelling submission ...");
            }
        })?;
        Ok(Self { state })
    }

    /// Shared handle to the flag.
    pub fn state(&self) -> Arc<InterruptState> {
        Arc::clone(&self.state)
    }

    /// Poll point for unarmed phases.
    pub fn is_interrupted(&self) -> bool {
        self.state.is_interrupted()
    }

    /// Begin a critical region. Code between `arm` and
    /// [`ArmedSection::disarm`] must not observe the interrupt flag.
    pub fn arm(&self) -> ArmedSection<'_> {
        ArmedSection { state: &self.state }
    }
}

/// A critical region in flight.
#[must_use = "an armed section must be disarmed to replay a deferred interrupt"]
pub struct ArmedSection<'a> {
    state: &'a InterruptState,
}

impl ArmedSection<'_> {
    /// End the critical region, replaying any interrupt recorded while it
    /// ran (or before it started).
    pub fn disarm(self) -> Result<(), Interrupted> {
        if self.state.is_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}
