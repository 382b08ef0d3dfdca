//! Concurrency primitives: channels, promises and completable futures.
//!
//! These are the only blocking operations the runtime exposes to user
//! code; everything else is synchronous on the executing thread.

pub mod channel;
pub mod future;
pub mod promise;

pub use channel::Channel;
pub use future::CompletableFuture;
pub use promise::Promise;
