//! Emote and nick autocompletion
//!
//! [`Suggester`] ranks candidates for a word fragment: a fragment starting
//! with the trigger character (`@` by default) searches nicks, anything else
//! searches emote names. Matching is a case-insensitive prefix test and
//! results are ordered case-insensitively, capped at a fixed maximum.
//!
//! [`Completer`] holds the cycling state behind repeated Tab presses. Every
//! replacement is computed from the live document and cursor as a
//! [`Replacement`] over an explicit `(start, end)` byte span, so repeated
//! cycling never drifts from what is actually in the input box.

use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_TRIGGER: char = '@';
pub const DEFAULT_MAX_SUGGESTIONS: usize = 20;

/// Ranks emote and nick candidates for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggester {
    trigger: char,
    max_suggestions: usize,
}

impl Default for Suggester {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER, DEFAULT_MAX_SUGGESTIONS)
    }
}

impl Suggester {
    pub fn new(trigger: char, max_suggestions: usize) -> Self {
        Self {
            trigger,
            max_suggestions,
        }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    /// Suggestions for `fragment`.
    ///
    /// An empty fragment yields nothing. A bare trigger lists nicks.
    pub fn suggest(
        &self,
        fragment: &str,
        emotes: &HashSet<String>,
        nicks: &HashSet<String>,
    ) -> Vec<String> {
        if fragment.is_empty() {
            return Vec::new();
        }
        let (needle, pool) = match fragment.strip_prefix(self.trigger) {
            Some(rest) => (rest, nicks),
            None => (fragment, emotes),
        };

        let needle = needle.to_lowercase();
        let mut ranked: Vec<(String, &String)> = pool
            .iter()
            .filter_map(|name| {
                let folded = name.to_lowercase();
                folded.starts_with(&needle).then_some((folded, name))
            })
            .collect();
        ranked.sort();
        ranked.truncate(self.max_suggestions);
        ranked.into_iter().map(|(_, name)| name.clone()).collect()
    }
}

/// Suggestions for `fragment` with the default trigger and cap.
pub fn suggest(fragment: &str, emotes: &HashSet<String>, nicks: &HashSet<String>) -> Vec<String> {
    Suggester::default().suggest(fragment, emotes, nicks)
}

/// Cycling direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Edit to apply to the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// Byte offset where the replaced span starts
    pub start: usize,
    /// Byte offset one past the replaced span
    pub end: usize,
    /// Text that replaces the span
    pub text: String,
    /// Cursor position after the edit
    pub cursor: usize,
}

impl Replacement {
    /// Apply to `doc` and return the new cursor position.
    pub fn apply(&self, doc: &mut String) -> usize {
        doc.replace_range(self.start..self.end, &self.text);
        self.cursor
    }
}

/// Observable completion state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionState {
    /// Word fragment the suggestions were computed for
    pub fragment: String,
    pub suggestions: Vec<String>,
    /// Selected suggestion while cycling
    pub index: Option<usize>,
    /// Last word inserted by completion
    pub last_accepted: Option<String>,
}

#[derive(Debug, Clone)]
struct Insertion {
    start: usize,
    token: String,
}

impl Insertion {
    fn inserted_text(&self) -> String {
        format!("{} ", self.token)
    }
}

/// Completion cycling over an input document.
#[derive(Debug, Clone, Default)]
pub struct Completer {
    suggester: Suggester,
    state: SuggestionState,
    inserted: Option<Insertion>,
}

impl Completer {
    pub fn new(suggester: Suggester) -> Self {
        Self {
            suggester,
            state: SuggestionState::default(),
            inserted: None,
        }
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn is_cycling(&self) -> bool {
        self.state.index.is_some()
    }

    /// Recompute suggestions for the word under `cursor`. Ends cycling.
    pub fn refresh(
        &mut self,
        doc: &str,
        cursor: usize,
        emotes: &HashSet<String>,
        nicks: &HashSet<String>,
    ) -> &[String] {
        let cursor = clamp_cursor(doc, cursor);
        let (start, _) = word_span(doc, cursor);
        let fragment = &doc[start..cursor];

        self.state.fragment = fragment.to_string();
        self.state.suggestions = self.suggester.suggest(fragment, emotes, nicks);
        self.state.index = None;
        self.inserted = None;
        &self.state.suggestions
    }

    /// Select the next (or previous) suggestion and produce the edit that
    /// puts it in place of the word under `cursor`.
    ///
    /// Returns `None` when there is nothing to suggest.
    pub fn advance(
        &mut self,
        doc: &str,
        cursor: usize,
        direction: Direction,
        emotes: &HashSet<String>,
        nicks: &HashSet<String>,
    ) -> Option<Replacement> {
        let cursor = clamp_cursor(doc, cursor);

        if let (Some(index), Some(insertion)) = (self.state.index, self.inserted.as_ref()) {
            let start = insertion.start;
            let still_in_place = doc
                .get(start..cursor)
                .is_some_and(|span| span == insertion.inserted_text());
            let len = self.state.suggestions.len();
            if still_in_place && len > 0 {
                let next = match direction {
                    Direction::Forward => (index + 1) % len,
                    Direction::Backward => (index + len - 1) % len,
                };
                return Some(self.select(next, start, cursor));
            }
            tracing::debug!("Document changed under completion, starting over");
        }

        let (start, mut end) = word_span(doc, cursor);
        let fragment = &doc[start..cursor];
        if fragment != self.state.fragment || self.state.suggestions.is_empty() {
            self.refresh(doc, cursor, emotes, nicks);
        }
        if self.state.suggestions.is_empty() {
            return None;
        }

        // Reuse a separator that already follows the word.
        if doc[end..].starts_with(' ') {
            end += 1;
        }
        let first = match direction {
            Direction::Forward => 0,
            Direction::Backward => self.state.suggestions.len() - 1,
        };
        Some(self.select(first, start, end))
    }

    /// Stop cycling, keeping the inserted word for [`Completer::reopen`].
    pub fn accept(&mut self) -> Option<&str> {
        self.state.index = None;
        self.inserted = None;
        self.state.last_accepted.as_deref()
    }

    /// Show suggestions for the last inserted word again without retyping.
    pub fn reopen(&mut self, emotes: &HashSet<String>, nicks: &HashSet<String>) -> &[String] {
        if let Some(word) = self.state.last_accepted.clone() {
            self.state.suggestions = self.suggester.suggest(&word, emotes, nicks);
            self.state.fragment = word;
            self.state.index = None;
        }
        &self.state.suggestions
    }

    /// Typing, moving the cursor to another word, or cancelling.
    pub fn reset(&mut self) {
        self.state.index = None;
        self.state.last_accepted = None;
        self.inserted = None;
    }

    fn select(&mut self, index: usize, start: usize, end: usize) -> Replacement {
        let suggestion = &self.state.suggestions[index];
        let token = if self.state.fragment.starts_with(self.suggester.trigger) {
            format!("{}{}", self.suggester.trigger, suggestion)
        } else {
            suggestion.clone()
        };

        let insertion = Insertion { start, token };
        let text = insertion.inserted_text();
        let replacement = Replacement {
            start,
            end,
            cursor: start + text.len(),
            text,
        };

        self.state.index = Some(index);
        self.state.last_accepted = Some(insertion.token.clone());
        self.inserted = Some(insertion);
        replacement
    }
}

/// Clamp `cursor` into `doc` and back onto a char boundary.
fn clamp_cursor(doc: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(doc.len());
    while !doc.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Byte span of the whitespace-delimited word touching `cursor`.
fn word_span(doc: &str, cursor: usize) -> (usize, usize) {
    let start = doc[..cursor]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(idx, c)| idx + c.len_utf8());
    let end = doc[cursor..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map_or(doc.len(), |(idx, _)| cursor + idx);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn emotes() -> HashSet<String> {
        set(&["PepeLaugh", "Pepega", "pepoG", "LUL", "Clap"])
    }

    #[test]
    fn test_nick_mode_with_trigger() {
        let nicks = set(&["Alice", "albert", "Bob"]);
        let out = suggest("@al", &emotes(), &nicks);
        assert_eq!(out, vec!["albert", "Alice"]);
    }

    #[test]
    fn test_emote_mode_ignores_nicks() {
        let nicks = set(&["Pepper"]);
        let out = suggest("pep", &emotes(), &nicks);
        assert_eq!(out, vec!["Pepega", "PepeLaugh", "pepoG"]);
    }

    #[test]
    fn test_empty_fragment_yields_nothing() {
        assert!(suggest("", &emotes(), &set(&["ann"])).is_empty());
        assert_eq!(suggest("@", &set(&[]), &set(&["ann"])), vec!["ann"]);
    }

    #[test]
    fn test_results_are_capped_and_prefix_matched() {
        let many: HashSet<String> = (0..50).map(|i| format!("Emote{:02}", i)).collect();
        let out = suggest("emo", &many, &set(&[]));
        assert_eq!(out.len(), DEFAULT_MAX_SUGGESTIONS);
        assert_eq!(out[0], "Emote00");
        for pair in out.windows(2) {
            assert!(pair[0].to_lowercase() <= pair[1].to_lowercase());
        }
        assert!(out.iter().all(|s| s.to_lowercase().starts_with("emo")));
    }

    #[test]
    fn test_custom_trigger_and_cap() {
        let suggester = Suggester::new('+', 1);
        let out = suggester.suggest("+a", &set(&[]), &set(&["ann", "abe"]));
        assert_eq!(out, vec!["abe"]);
        assert!(suggester.suggest("@a", &set(&[]), &set(&["ann"])).is_empty());
    }

    #[test]
    fn test_word_span() {
        assert_eq!(word_span("hello wor", 9), (6, 9));
        assert_eq!(word_span("hello wor ld", 8), (6, 9));
        assert_eq!(word_span("", 0), (0, 0));
    }

    #[test]
    fn test_first_advance_replaces_word_and_adds_separator() {
        let mut completer = Completer::default();
        let mut doc = String::from("nice LU");
        let cursor = doc.len();

        let edit = completer
            .advance(&doc, cursor, Direction::Forward, &emotes(), &set(&[]))
            .unwrap();
        let cursor = edit.apply(&mut doc);

        assert_eq!(doc, "nice LUL ");
        assert_eq!(cursor, doc.len());
        assert_eq!(completer.state().index, Some(0));
        assert_eq!(completer.state().last_accepted.as_deref(), Some("LUL"));
    }

    #[test]
    fn test_cycling_wraps_without_drift() {
        let mut completer = Completer::default();
        let mut doc = String::from("pep and more");
        let mut cursor = 3;

        let mut seen = Vec::new();
        for _ in 0..4 {
            let edit = completer
                .advance(&doc, cursor, Direction::Forward, &emotes(), &set(&[]))
                .unwrap();
            cursor = edit.apply(&mut doc);
            seen.push(doc.clone());
        }

        assert_eq!(
            seen,
            vec![
                "Pepega and more",
                "PepeLaugh and more",
                "pepoG and more",
                "Pepega and more",
            ]
        );
        assert_eq!(&doc[cursor..], "and more");
    }

    #[test]
    fn test_backward_starts_from_last() {
        let mut completer = Completer::default();
        let mut doc = String::from("pep");
        let edit = completer
            .advance(&doc, 3, Direction::Backward, &emotes(), &set(&[]))
            .unwrap();
        let cursor = edit.apply(&mut doc);
        assert_eq!(doc, "pepoG ");

        let edit = completer
            .advance(&doc, cursor, Direction::Backward, &emotes(), &set(&[]))
            .unwrap();
        edit.apply(&mut doc);
        assert_eq!(doc, "PepeLaugh ");
    }

    #[test]
    fn test_nick_completion_keeps_trigger() {
        let mut completer = Completer::default();
        let mut doc = String::from("hi @al");
        let nicks = set(&["Alice", "albert", "Bob"]);
        let edit = completer
            .advance(&doc, doc.len(), Direction::Forward, &set(&[]), &nicks)
            .unwrap();
        edit.apply(&mut doc);
        assert_eq!(doc, "hi @albert ");
    }

    #[test]
    fn test_edit_under_cursor_restarts_cycle() {
        let mut completer = Completer::default();
        let mut doc = String::from("pep");
        let edit = completer
            .advance(&doc, 3, Direction::Forward, &emotes(), &set(&[]))
            .unwrap();
        edit.apply(&mut doc);
        assert_eq!(doc, "Pepega ");

        // User replaces the text externally; the old insertion no longer matches.
        let mut doc = String::from("Cl");
        let edit = completer
            .advance(&doc, 2, Direction::Forward, &emotes(), &set(&[]))
            .unwrap();
        edit.apply(&mut doc);
        assert_eq!(doc, "Clap ");
    }

    #[test]
    fn test_reset_clears_cycle_and_last_accepted() {
        let mut completer = Completer::default();
        let doc = String::from("LU");
        completer.advance(&doc, 2, Direction::Forward, &emotes(), &set(&[]));
        assert!(completer.is_cycling());

        completer.reset();
        assert!(!completer.is_cycling());
        assert!(completer.state().last_accepted.is_none());
    }

    #[test]
    fn test_accept_then_reopen() {
        let mut completer = Completer::default();
        let doc = String::from("Pepe");
        completer.advance(&doc, 4, Direction::Forward, &emotes(), &set(&[]));
        assert_eq!(completer.accept(), Some("Pepega"));
        assert!(!completer.is_cycling());

        let reopened = completer.reopen(&emotes(), &set(&[])).to_vec();
        assert_eq!(reopened, vec!["Pepega"]);
    }

    #[test]
    fn test_no_suggestions_no_edit() {
        let mut completer = Completer::default();
        assert!(completer
            .advance("zzz", 3, Direction::Forward, &emotes(), &set(&[]))
            .is_none());
        assert!(completer
            .advance("", 0, Direction::Forward, &emotes(), &set(&[]))
            .is_none());
    }

    #[test]
    fn test_cursor_clamped_to_char_boundary() {
        let mut completer = Completer::default();
        let doc = "é";
        // Offset 1 is inside the two-byte char.
        let suggestions = completer.refresh(doc, 1, &emotes(), &set(&[]));
        assert!(suggestions.is_empty());
        assert_eq!(completer.state().fragment, "");
    }
}
