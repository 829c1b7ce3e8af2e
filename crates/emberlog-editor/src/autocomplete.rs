//! Link autocomplete
//!
//! Watches the text before the caret for an unterminated `[[` token and
//! drives a bounded suggestion list from the reference index. State is
//! recomputed on every text change and caret move with a synchronous scan;
//! document sizes make incremental indexing unnecessary.

use emberlog_core::index::{LinkSuggestion, ReferenceIndex};

use crate::document::{snap_boundary, Selection};

/// An unterminated `[[` token the caret is inside of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCompletion {
    /// Byte offset of the unmatched `[[` in the display text.
    pub open_offset: usize,
    /// Text between the brackets and the caret.
    pub query: String,
}

/// A text edit that commits a suggestion: replace `start..end` with
/// `insert` and place the caret at `caret_after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEdit {
    pub start: usize,
    pub end: usize,
    pub insert: String,
    pub caret_after: usize,
}

/// Keys the suggestion list intercepts while visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKey {
    Down,
    Up,
    Enter,
    Tab,
    Escape,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// List not visible (or key not relevant); host handles the key.
    Ignored,
    /// Key moved the selection or hid the list; no text change.
    Consumed,
    /// Enter/Tab committed the selected suggestion.
    Commit(CommitEdit),
}

/// Suggestion list state.
#[derive(Debug, Default)]
pub struct AutocompleteState {
    active: Option<ActiveCompletion>,
    suggestions: Vec<LinkSuggestion>,
    selected: usize,
}

impl AutocompleteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute completion state for the given text and caret.
    ///
    /// An open bracket pair is unmatched when no `]]` appears between it and
    /// the caret; only then is the list shown.
    pub fn rescan(&mut self, text: &str, caret: usize, index: &ReferenceIndex<'_>) {
        let caret = Selection::cursor(caret).clamp(text.len()).start;
        let caret = snap_boundary(text, caret);
        let before = &text[..caret];

        let open = before.rfind("[[");
        let close = before.rfind("]]");

        let active = match (open, close) {
            (Some(open), Some(close)) if open > close => Some(open),
            (Some(open), None) => Some(open),
            _ => None,
        };

        match active {
            Some(open_offset) => {
                let query = before[open_offset + 2..].to_string();
                let suggestions = index.search(&query);
                if suggestions != self.suggestions {
                    // List contents changed; selection cursor resets.
                    self.selected = 0;
                }
                self.suggestions = suggestions;
                self.active = Some(ActiveCompletion { open_offset, query });
            }
            None => self.dismiss(),
        }
    }

    pub fn active(&self) -> Option<&ActiveCompletion> {
        self.active.as_ref()
    }

    pub fn suggestions(&self) -> &[LinkSuggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Whether the suggestion list is shown. Zero matches is a valid,
    /// hidden, non-error state.
    pub fn is_visible(&self) -> bool {
        self.active.is_some() && !self.suggestions.is_empty()
    }

    /// Hide the list without modifying text.
    pub fn dismiss(&mut self) {
        self.active = None;
        self.suggestions.clear();
        self.selected = 0;
    }

    /// Handle a key press while the list may be visible.
    pub fn handle_key(&mut self, key: SuggestionKey, caret: usize) -> KeyOutcome {
        if !self.is_visible() {
            return KeyOutcome::Ignored;
        }

        match key {
            SuggestionKey::Down => {
                if self.selected + 1 < self.suggestions.len() {
                    self.selected += 1;
                }
                KeyOutcome::Consumed
            }
            SuggestionKey::Up => {
                self.selected = self.selected.saturating_sub(1);
                KeyOutcome::Consumed
            }
            SuggestionKey::Enter | SuggestionKey::Tab => match self.commit_at(self.selected, caret)
            {
                Some(edit) => KeyOutcome::Commit(edit),
                None => KeyOutcome::Consumed,
            },
            SuggestionKey::Escape => {
                self.dismiss();
                KeyOutcome::Consumed
            }
        }
    }

    /// Commit the suggestion at `index_in_list` (pointer click path).
    ///
    /// Replaces everything from the unmatched `[[` through the caret with
    /// the full `[[anchor]]` token and hides the list.
    pub fn commit_at(&mut self, index_in_list: usize, caret: usize) -> Option<CommitEdit> {
        let active = self.active.as_ref()?;
        let suggestion = self.suggestions.get(index_in_list)?;

        let insert = suggestion.token();
        let edit = CommitEdit {
            start: active.open_offset,
            end: caret,
            caret_after: active.open_offset + insert.len(),
            insert,
        };
        self.dismiss();
        Some(edit)
    }
}
