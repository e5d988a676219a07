//! Envelope construction and serialization.
//!
//! Encoding is deterministic: identical inputs produce byte-identical wire
//! text. The indentation contract prefixes every payload line with exactly
//! two spaces; interior blank lines keep the prefix so they round-trip as
//! empty lines, and one trailing blank produced by a final newline is
//! trimmed from the end of the block.

use crate::config::EnvelopeDefaults;
use crate::envelope::{Envelope, EnvelopeKind, Intent};
use crate::error::EnvelopeError;
use crate::parse::classify;
use crate::session::generate_session_id;

/// Caller-supplied fields for building one request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFields {
    pub sender: String,
    pub receiver: String,
    pub version: u32,
    /// Optional `user:` line carried verbatim between header and session.
    pub user: Option<String>,
    pub context: String,
    pub intent: Intent,
    pub body: String,
    /// Generated fresh at encode time when absent.
    pub session: Option<String>,
}

impl RequestFields {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        version: u32,
        context: impl Into<String>,
        intent: Intent,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            version,
            user: None,
            context: context.into(),
            intent,
            body: body.into(),
            session: None,
        }
    }

    /// Builds fields from environment-sourced correspondent defaults.
    pub fn from_defaults(
        defaults: &EnvelopeDefaults,
        context: impl Into<String>,
        intent: Intent,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: defaults.sender.clone(),
            receiver: defaults.receiver.clone(),
            version: defaults.version,
            user: defaults.user.clone(),
            context: context.into(),
            intent,
            body: body.into(),
            session: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }
}

/// Serializes a request envelope to wire text.
///
/// The body must be non-empty after newline normalization; the context must
/// be non-empty. A missing session id is generated fresh.
pub fn encode_request(fields: &RequestFields) -> Result<String, EnvelopeError> {
    if fields.context.trim().is_empty() {
        return Err(EnvelopeError::missing("context"));
    }
    let body = indent_block(&fields.body).ok_or(EnvelopeError::missing("body"))?;
    let session = match &fields.session {
        Some(session) => session.trim().to_string(),
        None => generate_session_id(),
    };

    let mut wire = format!("[[{}→{} v{}]]\n", fields.sender, fields.receiver, fields.version);
    if let Some(user) = &fields.user {
        wire.push_str(&format!("user: {user}\n"));
    }
    wire.push_str(&format!("session: {session}\n"));
    wire.push_str(&format!("context: {}\n", fields.context));
    wire.push_str(&format!("intent: {}\n", fields.intent.as_str()));
    wire.push_str(&format!("body: |\n{body}\n"));
    wire.push_str("sig: none\n[[END]]");
    Ok(wire)
}

/// Serializes a response envelope to wire text. The session id is copied
/// verbatim from the request being answered.
pub fn encode_response(
    sender: &str,
    receiver: &str,
    version: u32,
    session: &str,
    response_text: &str,
) -> Result<String, EnvelopeError> {
    if session.trim().is_empty() {
        return Err(EnvelopeError::missing("session"));
    }
    let block = indent_block(response_text).ok_or(EnvelopeError::missing("response"))?;
    Ok(format!(
        "[[{sender}→{receiver} v{version}]]\nsession: {session}\nresponse: |\n{block}\nsig: none\n[[END]]"
    ))
}

/// Builds the response wire text answering a parsed request: correspondents
/// swapped, session copied byte-for-byte.
pub fn reply(request: &Envelope, response_text: &str) -> Result<String, EnvelopeError> {
    if request.kind != EnvelopeKind::Request {
        return Err(EnvelopeError::NotARequest);
    }
    encode_response(
        &request.receiver,
        &request.sender,
        request.version,
        &request.session,
        response_text,
    )
}

/// Parses wire text into an [`Envelope`], then checks structural completeness
/// for its classified kind: context, intent, and body for requests, payload
/// content for responses.
pub fn decode(wire: &str) -> Result<Envelope, EnvelopeError> {
    let envelope = classify(wire)?;
    match envelope.kind {
        EnvelopeKind::Request => {
            if envelope.context.is_none() {
                return Err(EnvelopeError::missing("context"));
            }
            if envelope.intent.is_none() {
                return Err(EnvelopeError::missing("intent"));
            }
            if envelope.payload.is_empty() {
                return Err(EnvelopeError::missing("body"));
            }
        }
        EnvelopeKind::Response => {
            if envelope.payload.is_empty() {
                return Err(EnvelopeError::missing("response"));
            }
        }
    }
    Ok(envelope)
}

/// Prefixes every payload line with two spaces after normalizing line endings
/// to `\n`. Returns `None` when the payload has no content at all.
fn indent_block(text: &str) -> Option<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    if normalized.trim().is_empty() {
        return None;
    }
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    Some(
        lines
            .iter()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::indent_block;

    #[test]
    fn indentation_prefixes_every_line_and_trims_one_trailing_blank() {
        assert_eq!(indent_block("Ping?\n").as_deref(), Some("  Ping?"));
        assert_eq!(indent_block("a\nb").as_deref(), Some("  a\n  b"));
    }

    #[test]
    fn interior_blank_lines_keep_their_prefix() {
        assert_eq!(indent_block("a\n\nb\n").as_deref(), Some("  a\n  \n  b"));
    }

    #[test]
    fn carriage_returns_normalize_before_indentation() {
        assert_eq!(indent_block("a\r\nb\r\n").as_deref(), Some("  a\n  b"));
    }

    #[test]
    fn whitespace_only_payload_has_no_content() {
        assert_eq!(indent_block("   \n \n"), None);
        assert_eq!(indent_block(""), None);
    }
}
