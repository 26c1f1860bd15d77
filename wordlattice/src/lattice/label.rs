//! Word label of a lattice link.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::constants::NULL_LABEL;

/// The word carried by a link.
///
/// The reserved `!NULL` epsilon label is recognized once at parse time,
/// so that search and pruning compare a tag instead of a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// An epsilon transition that consumes no word.
    Null,
    /// An ordinary word.
    Word(SmolStr),
}

impl Label {
    /// Creates a label from its SLF text form.
    pub fn new(text: &str) -> Label {
        if text == NULL_LABEL {
            Label::Null
        } else {
            Label::Word(text.into())
        }
    }

    /// Whether this is the epsilon label.
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(self, Label::Null)
    }

    /// Whether this is exactly the given word. Never true for the
    /// epsilon label, whatever `word` is.
    #[inline(always)]
    pub fn is_word(&self, word: &str) -> bool {
        match self {
            Label::Null => false,
            Label::Word(w) => w == word,
        }
    }

    /// The SLF text form of the label.
    pub fn as_str(&self) -> &str {
        match self {
            Label::Null => NULL_LABEL,
            Label::Word(w) => w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_label_is_recognized() {
        assert!(Label::new("!NULL").is_null());
        assert!(!Label::new("!null").is_null());
        assert!(!Label::new("word").is_null());
    }

    #[test]
    fn null_label_never_matches_a_word() {
        assert!(!Label::new("!NULL").is_word("!NULL"));
        assert!(Label::new("word").is_word("word"));
        assert!(!Label::new("Word").is_word("word"));
    }

    #[test]
    fn text_form_round_trips() {
        assert_eq!(Label::new("!NULL").as_str(), "!NULL");
        assert_eq!(Label::new("New York").as_str(), "New York");
    }
}
