//! Environment configuration for correspondent defaults.

use std::env;

/// Default correspondent identity applied when callers build requests without
/// explicit sender/receiver fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeDefaults {
    pub sender: String,
    pub receiver: String,
    pub user: Option<String>,
    pub version: u32,
}

impl Default for EnvelopeDefaults {
    fn default() -> Self {
        Self {
            sender: "tool".to_string(),
            receiver: "agent".to_string(),
            user: None,
            version: 1,
        }
    }
}

impl EnvelopeDefaults {
    pub fn from_env() -> Self {
        let fallback = Self::default();
        Self {
            sender: env_string_opt("CROSSTALK_SENDER").unwrap_or(fallback.sender),
            receiver: env_string_opt("CROSSTALK_RECEIVER").unwrap_or(fallback.receiver),
            user: env_string_opt("CROSSTALK_USER"),
            version: env_string_opt("CROSSTALK_VERSION")
                .and_then(|value| value.parse().ok())
                .filter(|version| *version > 0)
                .unwrap_or(fallback.version),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
