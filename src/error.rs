use thiserror::Error;

/// Structured failures produced by the codec and classifier.
///
/// Each variant carries enough detail to build a short human-readable message
/// without re-parsing the offending text. Classification ambiguity is never an
/// error; the dialect priority rule resolves it deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The `[[sender→receiver vN]]` header or the `[[END]]` footer is absent;
    /// nothing can be classified.
    #[error("malformed envelope: header or [[END]] footer not found")]
    MalformedEnvelope,

    /// A field required for the envelope's classified kind is absent or empty.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// Neither `body:` nor `response:` is present.
    #[error("envelope has neither a `body:` nor a `response:` payload field")]
    NoPayloadField,

    /// A response was requested for something that is not a request envelope.
    #[error("a reply can only be built for a request envelope")]
    NotARequest,
}

impl EnvelopeError {
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}
