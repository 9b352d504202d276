//! Poll module - Waits for externally driven cluster state to converge.
//!
//! The [`Poller`] re-fetches a target on a fixed tick and asks a predicate whether to
//! keep waiting. It stops when the predicate is done, when the timeout elapses, or
//! when the cancellation token fires. None of these is an error.

mod config;
mod pod_ips;
mod poller;

pub use config::*;
pub use pod_ips::*;
pub use poller::*;
