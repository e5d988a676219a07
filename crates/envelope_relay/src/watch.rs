//! Cooperative blocking watch loop over the tick-driven [`Correlator`].

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crosstalk::Envelope;
use surface_provider::{BlockSource, CancelSignal, Transport};

use crate::correlator::{Correlator, PollOutcome, RelayError, WatchState};
use crate::events::WatchEvent;

/// Tick pacing for the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Delay before the first poll after submission, leaving the surface time
    /// to render the request itself.
    pub first_tick: Duration,
    /// Interval between subsequent polls.
    pub tick_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            first_tick: Duration::from_millis(1000),
            tick_interval: Duration::from_millis(500),
        }
    }
}

/// Submits `request` through `transport`, then polls `source` until a
/// session-matching response arrives, the cancel signal is observed, or the
/// source becomes unavailable.
///
/// Returns `Ok(Some(envelope))` on a match, `Ok(None)` when the watch ended
/// without one (cancelled, or halted on an unreachable source), and `Err` when
/// submission itself failed. There is no built-in timeout; bound the watch
/// with the cancel signal. Lifecycle events are delivered through `emit` as
/// they occur.
pub fn run_exchange(
    correlator: &mut Correlator,
    request: &Envelope,
    transport: &mut dyn Transport,
    source: &dyn BlockSource,
    cancel: &CancelSignal,
    options: WatchOptions,
    emit: &mut dyn FnMut(WatchEvent),
) -> Result<Option<Envelope>, RelayError> {
    if let Err(error) = correlator.submit(request, transport) {
        emit(WatchEvent::SubmitFailed {
            reason: error.to_string(),
        });
        return Err(error);
    }
    let session = request.session.trim().to_string();
    emit(WatchEvent::Submitted {
        session: session.clone(),
    });

    let baseline = match source.block_count() {
        Ok(count) => count,
        Err(error) => {
            // Baseline unreadable: halt before watching. The exchange stays
            // open; the caller can cancel and retry.
            emit(WatchEvent::SourceUnavailable {
                reason: error.to_string(),
            });
            return Ok(None);
        }
    };
    correlator.acknowledge(baseline);

    run_watch(correlator, source, cancel, options, emit)
}

/// Polls an already-watching correlator until a terminal outcome. Usable on
/// its own to resume a watch halted by source unavailability.
pub fn run_watch(
    correlator: &mut Correlator,
    source: &dyn BlockSource,
    cancel: &CancelSignal,
    options: WatchOptions,
    emit: &mut dyn FnMut(WatchEvent),
) -> Result<Option<Envelope>, RelayError> {
    if correlator.state() != WatchState::Watching {
        return Ok(None);
    }
    let session = correlator.target_session().unwrap_or_default().to_string();
    let mut delay = options.first_tick;

    loop {
        if cancelled(correlator, cancel, &session, emit) {
            return Ok(None);
        }
        thread::sleep(delay);
        delay = options.tick_interval;
        if cancelled(correlator, cancel, &session, emit) {
            return Ok(None);
        }

        match correlator.poll(source) {
            PollOutcome::Matched(envelope) => {
                emit(WatchEvent::Matched {
                    envelope: envelope.clone(),
                });
                return Ok(Some(envelope));
            }
            PollOutcome::StillWatching => {}
            PollOutcome::SourceUnavailable(error) => {
                emit(WatchEvent::SourceUnavailable {
                    reason: error.to_string(),
                });
                return Ok(None);
            }
        }
    }
}

fn cancelled(
    correlator: &mut Correlator,
    cancel: &CancelSignal,
    session: &str,
    emit: &mut dyn FnMut(WatchEvent),
) -> bool {
    if cancel.load(Ordering::SeqCst) {
        correlator.cancel();
        emit(WatchEvent::Cancelled {
            session: session.to_string(),
        });
        return true;
    }
    false
}
