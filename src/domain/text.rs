//! Text matching helpers for catalog search.
//!
//! Plain matching is a case-insensitive substring test. Accent-insensitive
//! matching folds both sides through the `slug` crate first, so "electronicos"
//! finds "Electrónicos"; spacing and punctuation collapse to `-` on both sides.

use slug::slugify;

/// How needle and haystack are normalized before a substring test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    CaseInsensitive,
    AccentInsensitive,
}

/// A search needle normalized once and tested against many fields.
#[derive(Debug, Clone)]
pub struct SearchNeedle {
    mode: MatchMode,
    folded: String,
    blank: bool,
}

impl SearchNeedle {
    pub fn new(raw: &str, mode: MatchMode) -> Self {
        Self {
            mode,
            folded: fold(raw, mode),
            blank: raw.trim().is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    pub fn matches(&self, haystack: &str) -> bool {
        // Only a blank needle matches everything; one that folds away matches nothing.
        if self.folded.is_empty() {
            return self.blank;
        }
        fold(haystack, self.mode).contains(&self.folded)
    }

    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        fields.into_iter().any(|field| self.matches(field))
    }
}

fn fold(input: &str, mode: MatchMode) -> String {
    match mode {
        MatchMode::CaseInsensitive => input.to_lowercase(),
        MatchMode::AccentInsensitive => slugify(input),
    }
}
