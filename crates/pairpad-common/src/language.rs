//! The supported-language enumeration as it appears on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language selection for a session.
///
/// `javascript` and `python` are the runnable set. Any other string arrives
/// as [`Language::Other`]: the session store accepts it (last-writer-wins on
/// an opaque value), and only the execution dispatcher rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    #[serde(untagged)]
    Other(String),
}

impl Language {
    /// The wire representation of this language.
    pub fn as_str(&self) -> &str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Other(s) => s,
        }
    }

    /// Whether this value is usable as a language selection at all.
    /// Empty/blank values are dropped at the protocol layer.
    pub fn is_empty(&self) -> bool {
        matches!(self, Language::Other(s) if s.trim().is_empty())
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Javascript
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_round_trip() {
        let js: Language = serde_json::from_str("\"javascript\"").unwrap();
        assert_eq!(js, Language::Javascript);
        assert_eq!(serde_json::to_string(&js).unwrap(), "\"javascript\"");

        let py: Language = serde_json::from_str("\"python\"").unwrap();
        assert_eq!(py, Language::Python);
        assert_eq!(serde_json::to_string(&py).unwrap(), "\"python\"");
    }

    #[test]
    fn unknown_language_passes_through() {
        let other: Language = serde_json::from_str("\"ruby\"").unwrap();
        assert_eq!(other, Language::Other("ruby".into()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"ruby\"");
    }

    #[test]
    fn default_is_javascript() {
        assert_eq!(Language::default(), Language::Javascript);
    }

    #[test]
    fn empty_values_are_flagged() {
        assert!(Language::Other(String::new()).is_empty());
        assert!(Language::Other("   ".into()).is_empty());
        assert!(!Language::Python.is_empty());
        assert!(!Language::Other("ruby".into()).is_empty());
    }
}
