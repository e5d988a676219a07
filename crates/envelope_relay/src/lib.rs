//! Response-watch relay for the crosstalk envelope protocol.
//!
//! Owns the one-exchange-in-flight invariant: a submitted request's session
//! id is watched for in an append-only stream of observed text blocks until
//! the first structurally valid, session-matching response arrives or the
//! caller cancels.
//!
//! The state machine in [`Correlator`] is advanced by discrete ticks and is
//! testable without wall-clock delays; [`run_exchange`] wraps it in a
//! cooperative blocking loop paced by real timers.

mod correlator;
mod events;
mod watch;

pub use correlator::{Correlator, PollOutcome, RelayError, WatchState};
pub use events::WatchEvent;
pub use watch::{run_exchange, run_watch, WatchOptions};
