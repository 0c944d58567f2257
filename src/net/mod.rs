//! Networking: a retrying, cancellable fetch built on `reqwest`.

pub mod challenge;
pub mod error;
pub mod operation;
pub mod strategy;
pub mod task;

pub use error::Error;
pub use operation::{NetworkOperation, NetworkOperationLifecycleDelegate, OperationState};
pub use strategy::{Decision, ExponentialBackoff, NetworkErrorHandlingStrategy, NoRetry};
pub use task::{Fetcher, RetryingTask, TaskState};
