//! Field extraction and request/response classification.
//!
//! Field values are located by an explicit keyword-tokenizing scan over the
//! text between the header and the footer, not by a union of per-dialect
//! patterns. A keyword only opens a field when it sits at the start of an
//! unindented line, so payload content can never be mistaken for a field.

use std::iter::Peekable;
use std::str::Lines;
use std::sync::OnceLock;

use regex::Regex;

use crate::envelope::{Envelope, EnvelopeKind, Intent};
use crate::error::EnvelopeError;

/// Literal end-of-envelope marker.
pub(crate) const FOOTER: &str = "[[END]]";

/// Cached `[[sender→receiver vN]]` header pattern.
pub(crate) fn header_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"\[\[(.+?)→(.+?)\s+v(\d+)\]\]").expect("header regex must compile")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    User,
    Session,
    Context,
    Intent,
    Body,
    Response,
    Sig,
}

const KEYWORDS: [(Keyword, &str); 7] = [
    (Keyword::User, "user:"),
    (Keyword::Session, "session:"),
    (Keyword::Context, "context:"),
    (Keyword::Intent, "intent:"),
    (Keyword::Body, "body:"),
    (Keyword::Response, "response:"),
    (Keyword::Sig, "sig:"),
];

fn keyword_at_line_start(line: &str) -> Option<(Keyword, &str)> {
    KEYWORDS
        .iter()
        .find_map(|(keyword, marker)| line.strip_prefix(marker).map(|rest| (*keyword, rest)))
}

/// Raw field spans found between header and footer. First occurrence wins;
/// later duplicates are ignored.
#[derive(Debug, Default)]
struct FieldScan {
    user: Option<String>,
    session: Option<String>,
    context: Option<String>,
    /// True when an `intent:` keyword occurred at all, even with a value the
    /// enumeration rejects. Presence alone drives kind classification.
    intent_present: bool,
    intent_value: Option<String>,
    body: Option<String>,
    response: Option<String>,
    signature: Option<String>,
}

fn scan_fields(region: &str) -> FieldScan {
    let mut scan = FieldScan::default();
    let mut lines = region.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((keyword, rest)) = keyword_at_line_start(line) else {
            continue;
        };

        match keyword {
            Keyword::Body | Keyword::Response if rest.trim() == "|" => {
                let block = collect_indented_block(&mut lines);
                let slot = if keyword == Keyword::Body {
                    &mut scan.body
                } else {
                    &mut scan.response
                };
                if slot.is_none() {
                    *slot = Some(block);
                }
            }
            // A `body:`/`response:` line without the block marker opens
            // nothing; the line is skipped like any unrecognized text.
            Keyword::Body | Keyword::Response => {}
            _ => {
                let value = collect_scalar_value(rest, &mut lines);
                if keyword == Keyword::Intent {
                    scan.intent_present = true;
                }
                let slot = match keyword {
                    Keyword::User => &mut scan.user,
                    Keyword::Session => &mut scan.session,
                    Keyword::Context => &mut scan.context,
                    Keyword::Intent => &mut scan.intent_value,
                    Keyword::Sig => &mut scan.signature,
                    Keyword::Body | Keyword::Response => unreachable!("handled above"),
                };
                if slot.is_none() {
                    *slot = Some(value);
                }
            }
        }
    }

    scan
}

/// A scalar value runs from its keyword to the next recognized keyword line,
/// so multi-token values (like session ids) survive intact.
fn collect_scalar_value(rest: &str, lines: &mut Peekable<Lines<'_>>) -> String {
    let mut value = rest.trim().to_string();
    while let Some(next) = lines.peek() {
        if keyword_at_line_start(next).is_some() {
            break;
        }
        let continuation = lines.next().unwrap_or_default().trim().to_string();
        if !continuation.is_empty() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(&continuation);
        }
    }
    value
}

/// An indented block runs to the next recognized keyword line. De-indentation
/// removes exactly one two-space prefix per line; interior blank lines are
/// kept, outer blank edges are trimmed with the rest of the surrounding
/// whitespace.
fn collect_indented_block(lines: &mut Peekable<Lines<'_>>) -> String {
    let mut collected: Vec<&str> = Vec::new();
    while let Some(next) = lines.peek() {
        if keyword_at_line_start(next).is_some() {
            break;
        }
        let line = lines.next().unwrap_or_default();
        collected.push(line.strip_prefix("  ").unwrap_or(line));
    }
    collected.join("\n").trim().to_string()
}

/// Extracts fields from one envelope's wire text and resolves its kind.
///
/// Kind resolution follows the dialect priority rule, in strict order:
///
/// 1. a `response:` block present ⇒ `Response`;
/// 2. a `body:` block with an `intent:` field ⇒ `Request`;
/// 3. a `body:` block without `intent:` ⇒ `Response` (the dialect that reuses
///    `body:` for replies);
/// 4. neither block ⇒ [`EnvelopeError::NoPayloadField`].
///
/// Header and footer are mandatory; `session` is mandatory; everything else
/// is captured when present. `context`/`intent` may appear in any order and
/// are dropped for responses.
pub fn classify(wire: &str) -> Result<Envelope, EnvelopeError> {
    let header = header_regex()
        .captures(wire)
        .ok_or(EnvelopeError::MalformedEnvelope)?;
    let header_span = header.get(0).ok_or(EnvelopeError::MalformedEnvelope)?;

    let after_header = header_span.end();
    let footer_offset = wire[after_header..]
        .find(FOOTER)
        .ok_or(EnvelopeError::MalformedEnvelope)?;
    let region = &wire[after_header..after_header + footer_offset];
    let raw = wire[header_span.start()..after_header + footer_offset + FOOTER.len()].to_string();

    let sender = header[1].trim().to_string();
    let receiver = header[2].trim().to_string();
    let version: u32 = header[3]
        .parse()
        .map_err(|_| EnvelopeError::MalformedEnvelope)?;

    let scan = scan_fields(region);
    let session = scan
        .session
        .filter(|value| !value.is_empty())
        .ok_or(EnvelopeError::missing("session"))?;

    let (kind, payload, context, intent) = if let Some(response) = scan.response {
        (EnvelopeKind::Response, response, None, None)
    } else if let Some(body) = scan.body {
        if scan.intent_present {
            let context = scan.context.filter(|value| !value.is_empty());
            let intent = scan.intent_value.as_deref().and_then(Intent::parse);
            (EnvelopeKind::Request, body, context, intent)
        } else {
            (EnvelopeKind::Response, body, None, None)
        }
    } else {
        return Err(EnvelopeError::NoPayloadField);
    };

    Ok(Envelope {
        sender,
        receiver,
        version,
        user: scan.user.filter(|value| !value.is_empty()),
        session,
        context,
        intent,
        kind,
        payload,
        signature: scan
            .signature
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "none".to_string()),
        raw,
    })
}
