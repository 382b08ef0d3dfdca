//! FIFO channels with close semantics.
//!
//! A channel wraps a crossbeam pair. Closing drops the sender half, so
//! queued values keep draining and a receive on a closed, drained channel
//! observes disconnect as `(nil, false)`. Send on a closed channel raises
//! StateError.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;

use crate::exceptions::{Exception, RunResult};
use crate::value::Value;

/// A FIFO channel: unbounded, or bounded with the given capacity.
/// Capacity 0 is a rendezvous channel.
pub struct Channel {
    sender: Mutex<Option<Sender<Value>>>,
    receiver: Receiver<Value>,
    closed: AtomicBool,
    capacity: Option<usize>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Channel(capacity={:?}, closed={})",
            self.capacity,
            self.is_closed()
        )
    }
}

impl Channel {
    pub fn unbounded() -> Self {
        let (tx, rx) = unbounded();
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: rx,
            closed: AtomicBool::new(false),
            capacity: None,
        }
    }

    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: rx,
            closed: AtomicBool::new(false),
            capacity: Some(capacity),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sends a value, blocking while the buffer is full (or, for a
    /// rendezvous channel, until a receiver arrives).
    pub fn send(&self, value: Value) -> RunResult<()> {
        // Clone the sender out of the lock so a blocking send does not
        // hold up close() from another thread.
        let sender = {
            let guard = self.sender.lock();
            match guard.as_ref() {
                Some(tx) if !self.is_closed() => tx.clone(),
                _ => return Err(Exception::state_error("send on closed channel")),
            }
        };
        sender
            .send(value)
            .map_err(|_| Exception::state_error("send on closed channel"))
    }

    /// Receives a value, blocking until one arrives. Returns
    /// `(value, true)`, or `(nil, false)` when the channel is closed and
    /// drained.
    pub fn recv(&self) -> (Value, bool) {
        match self.receiver.recv() {
            Ok(v) => (v, true),
            Err(_) => (Value::Nil, false),
        }
    }

    /// Non-blocking receive: `None` when nothing is ready, otherwise the
    /// same contract as [`Self::recv`].
    pub fn try_recv(&self) -> Option<(Value, bool)> {
        match self.receiver.try_recv() {
            Ok(v) => Some((v, true)),
            Err(crossbeam_channel::TryRecvError::Empty) => None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => Some((Value::Nil, false)),
        }
    }

    /// Closes the channel. Idempotent; pending receivers wake with
    /// `(nil, false)` once the buffer drains.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.sender.lock() = None;
    }

    /// The receiver half, for select multiplexing.
    pub fn receiver(&self) -> &Receiver<Value> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::ExcKind;

    #[test]
    fn buffered_send_recv_is_fifo() {
        let ch = Channel::bounded(3);
        ch.send(Value::Int(1)).unwrap();
        ch.send(Value::Int(2)).unwrap();
        assert!(matches!(ch.recv(), (Value::Int(1), true)));
        assert!(matches!(ch.recv(), (Value::Int(2), true)));
    }

    #[test]
    fn close_drains_then_reports_closed() {
        let ch = Channel::unbounded();
        ch.send(Value::Int(7)).unwrap();
        ch.close();

        assert!(matches!(ch.recv(), (Value::Int(7), true)));
        assert!(matches!(ch.recv(), (Value::Nil, false)));
        assert!(matches!(ch.recv(), (Value::Nil, false)));
    }

    #[test]
    fn send_after_close_is_a_state_error() {
        let ch = Channel::bounded(1);
        ch.close();
        ch.close(); // idempotent
        let err = ch.send(Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ExcKind::StateError);
    }

    #[test]
    fn rendezvous_channel_pairs_sender_and_receiver() {
        let ch = std::sync::Arc::new(Channel::bounded(0));
        let ch2 = ch.clone();
        let handle = std::thread::spawn(move || ch2.send(Value::Int(42)));
        assert!(matches!(ch.recv(), (Value::Int(42), true)));
        handle.join().unwrap().unwrap();
    }
}
