//! Manually-completable one-shot futures.

use std::fmt;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::exceptions::{Exception, RunResult};
use crate::value::Value;

#[derive(Debug)]
enum FutureState {
    Pending,
    Done(Result<Value, Exception>),
    Cancelled,
}

/// A one-shot result cell: the first `complete`, `completeExceptionally`
/// or `cancel` wins; later attempts report failure.
pub struct CompletableFuture {
    state: Mutex<FutureState>,
    cond: Condvar,
}

impl fmt::Debug for CompletableFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &*self.state.lock() {
            FutureState::Pending => "pending",
            FutureState::Done(_) => "done",
            FutureState::Cancelled => "cancelled",
        };
        write!(f, "CompletableFuture({label})")
    }
}

impl Default for CompletableFuture {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletableFuture {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FutureState::Pending),
            cond: Condvar::new(),
        }
    }

    fn transition(&self, next: FutureState) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, FutureState::Pending) {
            *state = next;
            self.cond.notify_all();
            true
        } else {
            false
        }
    }

    /// Completes with a value; false when already completed or cancelled.
    pub fn complete(&self, value: Value) -> bool {
        self.transition(FutureState::Done(Ok(value)))
    }

    /// Completes exceptionally; false when already completed or cancelled.
    pub fn complete_exceptionally(&self, err: Exception) -> bool {
        self.transition(FutureState::Done(Err(err)))
    }

    /// Cancels; only succeeds while still pending. Does not interrupt
    /// in-flight work.
    pub fn cancel(&self) -> bool {
        self.transition(FutureState::Cancelled)
    }

    pub fn is_done(&self) -> bool {
        !matches!(*self.state.lock(), FutureState::Pending)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), FutureState::Cancelled)
    }

    /// Blocks until completed; raises the exceptional completion, or
    /// StateError when cancelled.
    pub fn get(&self) -> RunResult<Value> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                FutureState::Done(Ok(value)) => return Ok(value.clone()),
                FutureState::Done(Err(err)) => return Err(err.clone()),
                FutureState::Cancelled => {
                    return Err(Exception::state_error("future was cancelled"));
                }
                FutureState::Pending => {}
            }
            self.cond.wait(&mut state);
        }
    }

    /// Blocks up to `timeout_ms`; raises RuntimeError on timeout.
    pub fn get_timeout(&self, timeout_ms: u64) -> RunResult<Value> {
        let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
        let mut state = self.state.lock();
        loop {
            match &*state {
                FutureState::Done(Ok(value)) => return Ok(value.clone()),
                FutureState::Done(Err(err)) => return Err(err.clone()),
                FutureState::Cancelled => {
                    return Err(Exception::state_error("future was cancelled"));
                }
                FutureState::Pending => {}
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return Err(Exception::runtime_error(format!(
                    "future did not complete within {timeout_ms}ms"
                )));
            }
            let _ = self.cond.wait_for(&mut state, deadline - now);
        }
    }
}
