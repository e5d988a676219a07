//! Minimal contracts for the externally observed chat surface.
//!
//! This crate defines only the delivery and observation seams the relay
//! engine drives. It excludes UI automation, clipboard access, DOM lookup,
//! and every other vendor-specific concern; those live behind implementations
//! of these traits.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

/// Shared cooperative cancellation flag for a watch loop.
///
/// Setting the flag is observed at the next scheduled tick, not preemptively.
pub type CancelSignal = Arc<AtomicBool>;

/// Error raised when the observed surface cannot be reached.
///
/// Unavailability may be transient (the observed context can come back), so
/// callers must not treat it as terminal on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnavailable {
    message: String,
}

impl SourceUnavailable {
    /// Creates a new source-unavailability report.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceUnavailable {}

impl From<String> for SourceUnavailable {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SourceUnavailable {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error raised when the transport refuses to accept wire text for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a new transport rejection.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Delivers request wire text to the remote correspondent.
pub trait Transport {
    /// Hands wire text to the correspondent.
    ///
    /// `Ok` means the text was accepted for delivery, not that a response
    /// will arrive.
    fn deliver(&mut self, wire_text: &str) -> Result<(), TransportError>;
}

/// A passively observed, append-only stream of text blocks.
///
/// The surface offers no change notification; callers poll `block_count` and
/// re-read the newest block on growth.
pub trait BlockSource {
    /// Current number of observed blocks.
    fn block_count(&self) -> Result<usize, SourceUnavailable>;

    /// Content of the newest block, or `None` when the surface is empty.
    fn latest_block(&self) -> Result<Option<String>, SourceUnavailable>;
}
