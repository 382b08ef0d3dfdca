//! Promise state machine.
//!
//! A promise is pending until fulfilled or rejected; terminal states are
//! sticky. Handlers registered before resolution fire in registration
//! order on the resolving thread; handlers registered after a terminal
//! state fire immediately but still asynchronously, on a spawned thread.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::args::Args;
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::value::{FuncValue, Value};

#[derive(Debug, Clone)]
enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Exception),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Then,
    Catch,
    Finally,
}

struct Handler {
    kind: HandlerKind,
    func: Arc<FuncValue>,
    next: Arc<Promise>,
    interp: Interp,
}

impl Handler {
    /// Runs against a terminal outcome, settling the chained promise.
    fn run(self, outcome: &Result<Value, Exception>) {
        match (self.kind, outcome) {
            (HandlerKind::Then, Ok(value)) => {
                match self.interp.call_function(&self.func, Args::new([value.clone()])) {
                    Ok(result) => self.next.fulfill(result),
                    Err(err) => self.next.reject(err),
                }
            }
            (HandlerKind::Then, Err(err)) => self.next.reject(err.clone()),
            (HandlerKind::Catch, Err(err)) => {
                let exc_value = self.interp.exception_to_value(err);
                match self.interp.call_function(&self.func, Args::new([exc_value])) {
                    Ok(result) => self.next.fulfill(result),
                    Err(err) => self.next.reject(err),
                }
            }
            (HandlerKind::Catch, Ok(value)) => self.next.fulfill(value.clone()),
            (HandlerKind::Finally, _) => {
                if let Err(err) = self.interp.call_function(&self.func, Args::empty()) {
                    log::warn!("error in promise finally handler: {err}");
                }
                // finally never changes the propagated outcome
                match outcome {
                    Ok(value) => self.next.fulfill(value.clone()),
                    Err(err) => self.next.reject(err.clone()),
                }
            }
        }
    }
}

struct PromiseInner {
    state: PromiseState,
    handlers: Vec<Handler>,
}

/// A promise: pending, then fulfilled with a value or rejected with an
/// exception.
pub struct Promise {
    inner: Mutex<PromiseInner>,
    cond: Condvar,
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Promise({})", self.state_name())
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::new()
    }
}

impl Promise {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PromiseInner {
                state: PromiseState::Pending,
                handlers: Vec::new(),
            }),
            cond: Condvar::new(),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.inner.lock().state {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled(_) => "fulfilled",
            PromiseState::Rejected(_) => "rejected",
        }
    }

    /// Transitions to fulfilled. A no-op when already terminal.
    pub fn fulfill(&self, value: Value) {
        self.settle(Ok(value));
    }

    /// Transitions to rejected. A no-op when already terminal.
    pub fn reject(&self, err: Exception) {
        self.settle(Err(err));
    }

    fn settle(&self, outcome: Result<Value, Exception>) {
        let handlers = {
            let mut inner = self.inner.lock();
            if !matches!(inner.state, PromiseState::Pending) {
                return;
            }
            inner.state = match &outcome {
                Ok(value) => PromiseState::Fulfilled(value.clone()),
                Err(err) => PromiseState::Rejected(err.clone()),
            };
            self.cond.notify_all();
            std::mem::take(&mut inner.handlers)
        };
        // Registration order, outside the lock so handlers may register
        // further handlers.
        for handler in handlers {
            handler.run(&outcome);
        }
    }

    fn register(&self, handler: Handler) {
        let mut inner = self.inner.lock();
        let outcome = match &inner.state {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(Ok(value.clone())),
            PromiseState::Rejected(err) => Some(Err(err.clone())),
        };
        match outcome {
            None => inner.handlers.push(handler),
            Some(outcome) => {
                drop(inner);
                std::thread::spawn(move || handler.run(&outcome));
            }
        }
    }

    /// Chains a fulfillment handler, returning the new promise.
    pub fn then(self: &Arc<Self>, interp: &Interp, func: Arc<FuncValue>) -> Arc<Self> {
        self.chain(HandlerKind::Then, interp, func)
    }

    /// Chains a rejection handler, returning the new promise.
    pub fn catch(self: &Arc<Self>, interp: &Interp, func: Arc<FuncValue>) -> Arc<Self> {
        self.chain(HandlerKind::Catch, interp, func)
    }

    /// Chains a handler that runs on either terminal state without
    /// changing the propagated value.
    pub fn finally(self: &Arc<Self>, interp: &Interp, func: Arc<FuncValue>) -> Arc<Self> {
        self.chain(HandlerKind::Finally, interp, func)
    }

    fn chain(self: &Arc<Self>, kind: HandlerKind, interp: &Interp, func: Arc<FuncValue>) -> Arc<Self> {
        let next = Arc::new(Self::new());
        self.register(Handler {
            kind,
            func,
            next: next.clone(),
            interp: interp.clone(),
        });
        next
    }

    /// Blocks the current thread until terminal; returns the value or
    /// raises the rejection.
    pub fn await_value(&self) -> RunResult<Value> {
        let mut inner = self.inner.lock();
        loop {
            match &inner.state {
                PromiseState::Fulfilled(value) => return Ok(value.clone()),
                PromiseState::Rejected(err) => return Err(err.clone()),
                PromiseState::Pending => {}
            }
            self.cond.wait(&mut inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_sticky() {
        let p = Promise::new();
        p.fulfill(Value::Int(1));
        p.fulfill(Value::Int(2));
        p.reject(Exception::runtime_error("late"));
        assert!(matches!(p.await_value(), Ok(Value::Int(1))));
        assert_eq!(p.state_name(), "fulfilled");
    }

    #[test]
    fn await_blocks_until_fulfilled() {
        let p = Arc::new(Promise::new());
        let p2 = p.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            p2.fulfill(Value::Int(9));
        });
        assert!(matches!(p.await_value(), Ok(Value::Int(9))));
    }

    #[test]
    fn rejection_surfaces_from_await() {
        let p = Promise::new();
        p.reject(Exception::runtime_error("boom"));
        let err = p.await_value().unwrap_err();
        assert_eq!(err.message, "boom");
    }
}
