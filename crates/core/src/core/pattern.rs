// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier number carried by a placeholder token.
pub type IdNum = u16;

/// Sentinel used when rendering identifiers for logs and displays.
///
/// The rendered form is five characters wide (`Ð` + three digits + `Ð`),
/// matching what a human operator sees in the conversation window. The
/// sentinel never participates in matching; patterns are matched on the
/// tagged tokens below, so it only needs to be absent from teacher alphabets
/// for the *rendered* form to stay unambiguous.
pub const ID_SENTINEL: char = 'Ð';

/// One token of a character-level pattern word.
///
/// An `Id` stands for exactly one character, bound on first sight during a
/// match and required to repeat on later sights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CharTok {
    Lit(char),
    Id(IdNum),
}

impl fmt::Display for CharTok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharTok::Lit(c) => write!(f, "{c}"),
            CharTok::Id(n) => write!(f, "{ID_SENTINEL}{n:03}{ID_SENTINEL}"),
        }
    }
}

/// A whitespace-delimited word of a character-level pattern.
pub type CharWord = Vec<CharTok>;

/// A character-level pattern: a sequence of words.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharPattern {
    pub words: Vec<CharWord>,
}

impl CharPattern {
    /// Build an all-literal pattern from a sentence.
    pub fn literal(sentence: &str) -> Self {
        Self {
            words: split_words(sentence)
                .iter()
                .map(|w| w.chars().map(CharTok::Lit).collect())
                .collect(),
        }
    }

    /// Distinct identifiers occurring in the pattern, in first-sight order.
    pub fn ids(&self) -> Vec<IdNum> {
        let mut out: Vec<IdNum> = Vec::new();
        for w in &self.words {
            for t in w {
                if let CharTok::Id(n) = t {
                    if !out.contains(n) {
                        out.push(*n);
                    }
                }
            }
        }
        out
    }

    pub fn id_count(&self) -> usize {
        self.ids().len()
    }

    /// True if `word` consists solely of identifier tokens.
    pub fn word_is_all_ids(word: &[CharTok]) -> bool {
        !word.is_empty() && word.iter().all(|t| matches!(t, CharTok::Id(_)))
    }
}

impl fmt::Display for CharPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            for t in w {
                write!(f, "{t}")?;
            }
        }
        Ok(())
    }
}

/// One segment of a word-level pattern slot.
///
/// An `Id` stands for one whole whitespace-delimited token. A slot made of
/// several segments denotes the concatenation of their substitutions, which
/// is how compound output words are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WordSeg {
    Lit(String),
    Id(IdNum),
}

impl fmt::Display for WordSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordSeg::Lit(s) => write!(f, "{s}"),
            WordSeg::Id(n) => write!(f, "{ID_SENTINEL}{n:03}{ID_SENTINEL}"),
        }
    }
}

/// A word-level pattern slot.
pub type WordTok = Vec<WordSeg>;

/// A word-level pattern: one slot per whitespace-delimited token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WordPattern {
    pub words: Vec<WordTok>,
}

impl WordPattern {
    pub fn ids(&self) -> Vec<IdNum> {
        let mut out: Vec<IdNum> = Vec::new();
        for w in &self.words {
            for s in w {
                if let WordSeg::Id(n) = s {
                    if !out.contains(n) {
                        out.push(*n);
                    }
                }
            }
        }
        out
    }

    pub fn id_count(&self) -> usize {
        self.ids().len()
    }
}

impl fmt::Display for WordPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            for s in w {
                write!(f, "{s}")?;
            }
        }
        Ok(())
    }
}

/// Split a sentence on whitespace.
pub fn split_words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

/// Strip a trailing ending character and surrounding blanks.
///
/// Witness sentences are normalized this way before abstraction, and inputs
/// the same way before application, so the ending never leaks into patterns.
pub fn strip_ending(s: &str, ending: Option<char>) -> &str {
    let mut out = s.trim_end_matches(' ');
    if let Some(e) = ending {
        if out.ends_with(e) {
            out = &out[..out.len() - e.len_utf8()];
        }
    }
    out.trim_end_matches(' ')
}

/// Per-position variability between two equally long word sequences.
///
/// `true` marks a variable position. Returns `None` when the sequences
/// cannot be aligned (different lengths or empty).
pub fn variability(a: &[&str], b: &[&str]) -> Option<Vec<bool>> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b.iter()).map(|(x, y)| x != y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_has_no_ids() {
        let p = CharPattern::literal("abc de");
        assert_eq!(p.words.len(), 2);
        assert_eq!(p.id_count(), 0);
        assert_eq!(p.to_string(), "abc de");
    }

    #[test]
    fn id_rendering_is_five_chars_wide() {
        let t = CharTok::Id(7);
        assert_eq!(t.to_string().chars().count(), 5);
        assert_eq!(t.to_string(), "Ð007Ð");
    }

    #[test]
    fn ids_reported_in_first_sight_order() {
        let p = CharPattern {
            words: vec![
                vec![CharTok::Id(3), CharTok::Id(1)],
                vec![CharTok::Lit('x'), CharTok::Id(3)],
            ],
        };
        assert_eq!(p.ids(), vec![3, 1]);
        assert_eq!(p.id_count(), 2);
    }

    #[test]
    fn strip_ending_removes_delimiter_and_blanks() {
        assert_eq!(strip_ending("abc .", Some('.')), "abc");
        assert_eq!(strip_ending("abc.", Some('.')), "abc");
        assert_eq!(strip_ending("abc", Some('.')), "abc");
        assert_eq!(strip_ending("abc  ", None), "abc");
    }

    #[test]
    fn variability_marks_differing_positions() {
        let a = ["the", "cat"];
        let b = ["the", "dog"];
        assert_eq!(variability(&a, &b), Some(vec![false, true]));
        assert_eq!(variability(&a, &["one"]), None);
    }
}
