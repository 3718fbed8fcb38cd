//! Script detection for the input text.
//!
//! A single Unicode-block test: any character in the Bengali block
//! (U+0980–U+09FF) marks the text as Bangla.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// The Bengali Unicode block.
pub const BENGALI_BLOCK: RangeInclusive<char> = '\u{0980}'..='\u{09FF}';

/// Result of [`detect_script`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptHint {
    /// At least one Bengali character is present.
    Bengali,

    /// Nothing but whitespace.
    Empty,

    /// Text without Bengali characters (Latin or anything else).
    Other,
}

impl ScriptHint {
    /// User-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bengali => "Bangla script detected",
            Self::Empty => "Paste text to analyse",
            Self::Other => "English / other (no Bangla characters)",
        }
    }
}

impl std::fmt::Display for ScriptHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `text`.
///
/// The Bengali check runs before the blank check, so Bengali characters
/// surrounded by whitespace still count as Bengali.
#[must_use]
pub fn detect_script(text: &str) -> ScriptHint {
    if text.chars().any(|c| BENGALI_BLOCK.contains(&c)) {
        ScriptHint::Bengali
    } else if text.trim().is_empty() {
        ScriptHint::Empty
    } else {
        ScriptHint::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_bengali() {
        assert_eq!(detect_script("আমি বাংলায় গান গাই"), ScriptHint::Bengali);
    }

    #[test]
    fn test_detect_mixed_text_is_bengali() {
        assert_eq!(detect_script("Hello বন্ধু!"), ScriptHint::Bengali);
    }

    #[test]
    fn test_detect_block_edges() {
        assert_eq!(detect_script("\u{0980}"), ScriptHint::Bengali);
        assert_eq!(detect_script("\u{09FF}"), ScriptHint::Bengali);
        // Devanagari sits just below the Bengali block
        assert_eq!(detect_script("\u{097F}"), ScriptHint::Other);
        assert_eq!(detect_script("\u{0A00}"), ScriptHint::Other);
    }

    #[test]
    fn test_detect_empty() {
        assert_eq!(detect_script(""), ScriptHint::Empty);
        assert_eq!(detect_script("  \n\t "), ScriptHint::Empty);
    }

    #[test]
    fn test_detect_latin() {
        assert_eq!(detect_script("The quick brown fox."), ScriptHint::Other);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ScriptHint::Bengali.to_string(), "Bangla script detected");
        assert_eq!(ScriptHint::Empty.label(), "Paste text to analyse");
        assert_eq!(
            ScriptHint::Other.label(),
            "English / other (no Bangla characters)"
        );
    }
}
