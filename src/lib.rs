//! Envelope wire engine for the crosstalk relay protocol.
//!
//! Invariant: classification is deterministic — the dialect priority rule in
//! [`parse::classify`] resolves every field-presence ambiguity without ever
//! surfacing an ambiguity error.
//!
//! # Public API Overview
//! - Build request/response wire text with [`encode_request`],
//!   [`encode_response`], and [`reply`].
//! - Parse and classify observed text with [`classify`], [`decode`], and
//!   [`validate`].
//! - Scan free-form transcripts for envelope blocks with [`has_envelope`],
//!   [`extract_all`], and [`find_last`].
//! - Mint correlation tokens with [`generate_session_id`].
//!
//! Response correlation against a live transcript lives in the
//! `envelope_relay` crate; this crate is pure text transform with no I/O and
//! no state.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod parse;
pub mod scan;
pub mod session;
pub mod validate;

/// Envelope construction and serialization.
pub use crate::codec::{decode, encode_request, encode_response, reply, RequestFields};

/// Correspondent defaults sourced from the environment.
pub use crate::config::EnvelopeDefaults;

/// Envelope value types.
pub use crate::envelope::{Envelope, EnvelopeKind, Intent};

/// Structured codec/classifier failures.
pub use crate::error::EnvelopeError;

/// Field extraction and kind classification.
pub use crate::parse::classify;

/// Transcript block scanning.
pub use crate::scan::{extract_all, find_last, has_envelope};

/// Correlation token generation.
pub use crate::session::generate_session_id;

/// Collect-all-violations validation.
pub use crate::validate::{validate, ValidationReport};
