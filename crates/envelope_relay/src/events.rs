use crosstalk::Envelope;
use serde::{Deserialize, Serialize};

/// Lifecycle event emitted while an exchange is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// The transport accepted the request for delivery.
    Submitted { session: String },
    /// A session-matching response envelope was observed.
    Matched { envelope: Envelope },
    /// The transport refused the request; the exchange never went in flight.
    SubmitFailed { reason: String },
    /// The block source could not be reached; polling halted but the
    /// correlation session stays open for manual cancellation or retry.
    SourceUnavailable { reason: String },
    /// The caller cancelled the exchange.
    Cancelled { session: String },
}

impl WatchEvent {
    /// Returns true when this event ends the correlation session.
    ///
    /// `SourceUnavailable` is deliberately not terminal: transient
    /// unavailability may recover and the watch can be resumed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Matched { .. } | Self::SubmitFailed { .. } | Self::Cancelled { .. }
        )
    }
}
