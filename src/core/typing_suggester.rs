//! Detection of in-progress trigger tokens (`@name`, `/command`) under the caret.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::graphemes::{is_newline, is_whitespace, TextRange};

/// Immutable configuration of one [`TypingSuggester`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSuggestionOptions {
    /// Trigger symbol. Compared against whole graphemes, so it should be a
    /// single user-perceived character.
    pub symbol: String,
    pub minimum_required_characters: usize,
    /// Only accept the symbol at the start of the buffer or of a line.
    pub should_trigger_only_at_start: bool,
}

impl TypingSuggestionOptions {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            minimum_required_characters: 0,
            should_trigger_only_at_start: false,
        }
    }

    #[must_use]
    pub fn minimum_required_characters(mut self, count: usize) -> Self {
        self.minimum_required_characters = count;
        self
    }

    #[must_use]
    pub fn trigger_only_at_start(mut self, only_at_start: bool) -> Self {
        self.should_trigger_only_at_start = only_at_start;
        self
    }
}

/// Text typed after a trigger symbol, up to the caret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypingSuggestion {
    /// Characters between the trigger and the caret, trigger excluded.
    pub text: String,
    /// Range of `text` inside the full buffer.
    pub location_range: TextRange,
}

impl TypingSuggestion {
    #[must_use]
    pub fn new(text: impl Into<String>, location_range: TextRange) -> Self {
        Self {
            text: text.into(),
            location_range,
        }
    }

    /// "No typed argument yet" placeholder for a command that already fired.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.location_range.length == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSuggester {
    options: TypingSuggestionOptions,
}

impl TypingSuggester {
    #[must_use]
    pub fn new(options: TypingSuggestionOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &TypingSuggestionOptions {
        &self.options
    }

    /// Returns the token being typed after the trigger symbol, if the caret is
    /// inside one.
    ///
    /// The symbol must be directly followed by a run of non-whitespace ending
    /// at the caret, and must itself sit at the start of the buffer or after
    /// whitespace (after a newline when start-only triggering is enabled).
    #[must_use]
    pub fn typing_suggestion(
        &self,
        full_text: &str,
        caret_location: usize,
    ) -> Option<TypingSuggestion> {
        let graphemes: Vec<&str> = full_text.graphemes(true).collect();
        if caret_location > graphemes.len() {
            return None;
        }

        let mut index = caret_location;
        let symbol_index = loop {
            if index == 0 {
                return None;
            }
            index -= 1;
            let grapheme = graphemes[index];
            if grapheme == self.options.symbol {
                break index;
            }
            if is_whitespace(grapheme) {
                return None;
            }
        };

        if symbol_index > 0 {
            let before = graphemes[symbol_index - 1];
            let anchored = if self.options.should_trigger_only_at_start {
                is_newline(before)
            } else {
                is_whitespace(before)
            };
            if !anchored {
                return None;
            }
        }

        let start = symbol_index + 1;
        let length = caret_location - start;
        if length < self.options.minimum_required_characters {
            return None;
        }

        Some(TypingSuggestion {
            text: graphemes[start..caret_location].concat(),
            location_range: TextRange::new(start, length),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentions() -> TypingSuggester {
        TypingSuggester::new(TypingSuggestionOptions::new("@"))
    }

    fn commands() -> TypingSuggester {
        TypingSuggester::new(TypingSuggestionOptions::new("/").trigger_only_at_start(true))
    }

    #[test]
    fn bare_symbol_yields_empty_suggestion_at_caret() {
        for (text, caret) in [("@", 1), ("Hey @", 5), ("a\n@", 3), ("@ tail", 1)] {
            let suggestion = mentions()
                .typing_suggestion(text, caret)
                .unwrap_or_else(|| panic!("expected suggestion for {text:?}"));
            assert_eq!(suggestion.text, "");
            assert_eq!(suggestion.location_range, TextRange::new(caret, 0));
        }
    }

    #[test]
    fn partial_mention_is_extracted() {
        let suggestion = mentions().typing_suggestion("Hey @Mar", 8).expect("suggestion");
        assert_eq!(suggestion.text, "Mar");
        assert_eq!(suggestion.location_range, TextRange::new(5, 3));
    }

    #[test]
    fn caret_inside_token_only_takes_text_before_caret() {
        let suggestion = mentions().typing_suggestion("@Martin", 3).expect("suggestion");
        assert_eq!(suggestion.text, "Ma");
        assert_eq!(suggestion.location_range, TextRange::new(1, 2));
    }

    #[test]
    fn whitespace_between_trigger_and_caret_breaks_token() {
        assert_eq!(mentions().typing_suggestion("@M art", 3), None);
        assert_eq!(mentions().typing_suggestion("@Mar\nx", 6), None);
    }

    #[test]
    fn symbol_glued_to_previous_word_is_ignored() {
        assert_eq!(mentions().typing_suggestion("Hello@User", 7), None);
        assert_eq!(mentions().typing_suggestion("mail user@domain", 16), None);
    }

    #[test]
    fn caret_out_of_bounds_returns_none() {
        assert_eq!(mentions().typing_suggestion("@Mar", 5), None);
        assert_eq!(mentions().typing_suggestion("", 1), None);
        assert_eq!(mentions().typing_suggestion("", 0), None);
    }

    #[test]
    fn text_without_symbol_returns_none() {
        assert_eq!(mentions().typing_suggestion("Martin", 6), None);
    }

    #[test]
    fn minimum_length_gate() {
        let suggester = TypingSuggester::new(
            TypingSuggestionOptions::new("@").minimum_required_characters(5),
        );
        assert_eq!(suggester.typing_suggestion("@Mar", 4), None);
        assert_eq!(suggester.typing_suggestion("@Mart", 5), None);
        let suggestion = suggester.typing_suggestion("@Marti", 6).expect("suggestion");
        assert_eq!(suggestion.text, "Marti");
    }

    #[test]
    fn start_only_trigger_accepts_buffer_start_and_line_start() {
        let suggestion = commands().typing_suggestion("/gi", 3).expect("suggestion");
        assert_eq!(suggestion.text, "gi");
        assert_eq!(suggestion.location_range, TextRange::new(1, 2));

        let suggestion = commands().typing_suggestion("Hey\n/mu", 7).expect("suggestion");
        assert_eq!(suggestion.text, "mu");
        assert_eq!(suggestion.location_range, TextRange::new(5, 2));

        let suggestion = commands().typing_suggestion("\n\n/x", 4).expect("suggestion");
        assert_eq!(suggestion.location_range, TextRange::new(3, 1));
    }

    #[test]
    fn start_only_trigger_rejects_mid_line_symbol() {
        assert_eq!(commands().typing_suggestion("hey /mute", 9), None);
        assert_eq!(commands().typing_suggestion("a/b", 3), None);
    }

    #[test]
    fn positions_count_graphemes() {
        let suggestion = mentions().typing_suggestion("👍🏽 @Amé", 6).expect("suggestion");
        assert_eq!(suggestion.text, "Amé");
        assert_eq!(suggestion.location_range, TextRange::new(3, 3));
    }

    #[test]
    fn empty_sentinel() {
        assert!(TypingSuggestion::empty().is_empty());
        assert!(!TypingSuggestion::new("x", TextRange::new(0, 1)).is_empty());
    }
}
