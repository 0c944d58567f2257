//! Concurrency primitives shared by the coordinator and the network layer.

pub mod future_once;
pub mod signal;
pub mod token;

pub use future_once::{deferred, Deferred, DeferredSender};
pub use signal::{Signal, SignalObserver};
pub use token::RequestToken;
