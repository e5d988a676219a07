//! Transcript block scanning.
//!
//! A block runs from a header marker to the *nearest* following footer
//! marker, never past it, so concatenated envelopes split cleanly instead of
//! one greedy match spanning them all.

use crate::envelope::Envelope;
use crate::error::EnvelopeError;
use crate::parse::{classify, header_regex, FOOTER};

/// True when `text` contains at least one complete envelope block.
#[must_use]
pub fn has_envelope(text: &str) -> bool {
    next_block(text, 0).is_some()
}

/// Every non-overlapping envelope block in `text`, in order of appearance.
#[must_use]
pub fn extract_all(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some((start, end)) = next_block(text, cursor) {
        blocks.push(&text[start..end]);
        cursor = end;
    }
    blocks
}

/// Classifies only the most recent envelope block in `text`, or `None` when
/// no complete block exists.
#[must_use]
pub fn find_last(text: &str) -> Option<Result<Envelope, EnvelopeError>> {
    extract_all(text).pop().map(classify)
}

fn next_block(text: &str, from: usize) -> Option<(usize, usize)> {
    let header = header_regex().find_at(text, from)?;
    let footer_offset = text[header.end()..].find(FOOTER)?;
    Some((header.start(), header.end() + footer_offset + FOOTER.len()))
}
