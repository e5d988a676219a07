//! Collect-all-violations validation.

use crate::envelope::{Envelope, EnvelopeKind, Intent};
use crate::parse::classify;

/// Outcome of validating one envelope's wire text.
///
/// `parsed` is present whenever classification itself succeeded, even when
/// field-level violations make the envelope invalid; callers can surface
/// every error in one pass without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub parsed: Option<Envelope>,
}

/// Classifies `wire` and checks the field invariants for its kind, collecting
/// all violations instead of stopping at the first.
#[must_use]
pub fn validate(wire: &str) -> ValidationReport {
    let envelope = match classify(wire) {
        Ok(envelope) => envelope,
        Err(error) => {
            return ValidationReport {
                valid: false,
                errors: vec![error.to_string()],
                parsed: None,
            }
        }
    };

    let mut errors = Vec::new();
    match envelope.kind {
        EnvelopeKind::Request => {
            if envelope.context.is_none() {
                errors.push("missing context field".to_string());
            }
            if envelope.intent.is_none() {
                errors.push(format!(
                    "intent must be one of {}",
                    Intent::ALL.map(|intent| intent.as_str()).join(", ")
                ));
            }
            if envelope.payload.is_empty() {
                errors.push("missing body content".to_string());
            }
        }
        EnvelopeKind::Response => {
            if envelope.payload.is_empty() {
                errors.push("missing response content".to_string());
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        parsed: Some(envelope),
    }
}
