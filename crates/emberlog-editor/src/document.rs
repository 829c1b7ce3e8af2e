//! Editable document state
//!
//! The in-memory document (title, body, tags, selection) is owned
//! exclusively by the active editor session; nothing mutates it
//! concurrently. Offsets are byte offsets into the display text the host's
//! text surface shows.

use emberlog_core::model::LogEntry;

/// A caret or selected range, normalized so `start <= end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_cursor(self) -> bool {
        self.start == self.end
    }

    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// Replace `selection` in `text` with `insert`.
///
/// Returns the new text and the caret position just after the insertion.
/// Offsets are snapped down to char boundaries before slicing.
pub fn splice_text(text: &str, selection: Selection, insert: &str) -> (String, usize) {
    let sel = selection.clamp(text.len());
    let start = snap_boundary(text, sel.start);
    let end = snap_boundary(text, sel.end);

    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..start]);
    out.push_str(insert);
    out.push_str(&text[end..]);
    (out, start + insert.len())
}

/// Snap a byte offset down to the nearest char boundary at or below it.
/// Hosts may report offsets in other units (UTF-16 code units, grapheme
/// counts); slicing must never split a code point.
pub fn snap_boundary(text: &str, mut pos: usize) -> usize {
    pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// The document being edited.
///
/// `body` is the canonical stored text (full image payloads); `selection`
/// is kept in display-text coordinates, since that is the text the user's
/// caret lives in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub title: String,
    body: String,
    tags: Vec<String>,
    selection: Selection,
}

impl Document {
    /// Fresh draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document loaded from an existing entry, or an empty draft.
    pub fn from_entry(entry: Option<&LogEntry>) -> Self {
        match entry {
            Some(entry) => Self {
                title: entry.title.clone(),
                body: entry.content.clone(),
                tags: entry.tags.clone(),
                selection: Selection::cursor(0),
            },
            None => Self::new(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: String, selection: Selection) {
        self.body = body;
        self.selection = selection;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn caret(&self) -> usize {
        self.selection.start
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        dedup_in_place(&mut self.tags);
    }

    /// Add a tag, trimming whitespace. Duplicates are collapsed silently.
    /// Returns whether the tag set changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns whether the tag set changed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// A document is empty when both trimmed title and trimmed body are.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.body.trim().is_empty()
    }
}

fn dedup_in_place(tags: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    tags.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(t.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_normalizes_and_clamps() {
        let sel = Selection::new(7, 3);
        assert_eq!(sel, Selection { start: 3, end: 7 });
        assert_eq!(sel.clamp(5), Selection { start: 3, end: 5 });
        assert!(Selection::cursor(2).is_cursor());
    }

    #[test]
    fn splice_replaces_selection_and_reports_caret() {
        let (text, caret) = splice_text("hello world", Selection::new(6, 11), "there");
        assert_eq!(text, "hello there");
        assert_eq!(caret, 11);

        let (text, caret) = splice_text("ab", Selection::cursor(1), "X");
        assert_eq!(text, "aXb");
        assert_eq!(caret, 2);
    }

    #[test]
    fn splice_snaps_to_char_boundaries() {
        // Caret landing mid-emoji must not split the code point.
        let text = "a📷b";
        let (out, _) = splice_text(text, Selection::cursor(2), "!");
        assert_eq!(out, "a!📷b");
    }

    #[test]
    fn tags_trim_and_deduplicate() {
        let mut doc = Document::new();
        assert!(doc.add_tag("  rust "));
        assert!(!doc.add_tag("rust"));
        assert!(!doc.add_tag("   "));
        assert!(doc.add_tag("wasm"));
        assert_eq!(doc.tags(), ["rust", "wasm"]);

        assert!(doc.remove_tag("rust"));
        assert!(!doc.remove_tag("rust"));
        assert_eq!(doc.tags(), ["wasm"]);
    }

    #[test]
    fn emptiness_ignores_whitespace() {
        let mut doc = Document::new();
        doc.title = "  ".to_string();
        doc.set_body("\n\t".to_string(), Selection::cursor(0));
        assert!(doc.is_empty());

        doc.title = "x".to_string();
        assert!(!doc.is_empty());
    }
}
