use serde::{Deserialize, Serialize};

/// Closed enumeration of request intents carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Question,
    Status,
    Patch,
    Note,
    Answer,
}

impl Intent {
    /// All wire spellings, in declaration order.
    pub const ALL: [Intent; 5] = [
        Intent::Question,
        Intent::Status,
        Intent::Patch,
        Intent::Note,
        Intent::Answer,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "QUESTION" => Self::Question,
            "STATUS" => Self::Status,
            "PATCH" => Self::Patch,
            "NOTE" => Self::Note,
            "ANSWER" => Self::Answer,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "QUESTION",
            Self::Status => "STATUS",
            Self::Patch => "PATCH",
            Self::Note => "NOTE",
            Self::Answer => "ANSWER",
        }
    }
}

/// Request/response classification. Derived by the classifier, never
/// transmitted as a field of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Request,
    Response,
}

/// One self-delimited protocol message, immutable once parsed or built.
///
/// `payload` holds the de-indented, trimmed `body`/`response` content; `raw`
/// keeps the exact wire text the envelope was parsed from (or serialized to)
/// so callers can re-select or re-copy the original block without
/// re-serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: String,
    pub receiver: String,
    pub version: u32,
    pub user: Option<String>,
    /// Correlation token, byte-compared (after trim) between a request and
    /// its response.
    pub session: String,
    /// Present on requests only.
    pub context: Option<String>,
    /// Present on requests only.
    pub intent: Option<Intent>,
    pub kind: EnvelopeKind,
    pub payload: String,
    /// Reserved, never verified. Currently always the literal `none`.
    pub signature: String,
    pub raw: String,
}

impl Envelope {
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.kind == EnvelopeKind::Request
    }

    #[must_use]
    pub fn is_response(&self) -> bool {
        self.kind == EnvelopeKind::Response
    }
}
